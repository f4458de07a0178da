pub mod day_ahead;
pub mod heartbeat;
pub mod home_assistant;
pub mod modbus;
