use std::fmt::Display;

use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use itertools::Itertools;

use crate::{
    core::{mask::DayMask, registers::Register, snapshot::BuySwitchMode},
    error::PlanError,
    planner::UpdateReport,
    registry::DeviceId,
};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

/// One row per hour, one cell per mask with the four quarter-hour slots.
pub fn build_mask_table<N: Display>(masks: &[(N, DayMask)]) -> Table {
    let mut table = new_table();
    table.set_header(
        std::iter::once(Cell::new("Hour"))
            .chain(masks.iter().map(|(name, _)| Cell::new(name)))
            .collect_vec(),
    );
    for hour in 0..24 {
        let slots = hour * 4..hour * 4 + 4;
        let mut row = vec![Cell::new(format!("{hour:02}:00")).add_attribute(Attribute::Dim)];
        for (_, mask) in masks {
            let n_set = slots.clone().filter(|slot| mask.is_set(*slot)).count();
            let text: String =
                slots.clone().map(|slot| if mask.is_set(slot) { '■' } else { '·' }).collect();
            row.push(Cell::new(text).set_alignment(CellAlignment::Center).fg(match n_set {
                0 => Color::DarkGrey,
                4 => Color::Green,
                _ => Color::DarkYellow,
            }));
        }
        table.add_row(row);
    }
    table
}

pub fn build_update_table(reports: &[(DeviceId, UpdateReport)]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Device", "Today", "Tomorrow"]);
    for (id, report) in reports {
        table.add_row(vec![
            Cell::new(id),
            build_outcome_cell(&report.today),
            build_outcome_cell(&report.tomorrow),
        ]);
    }
    table
}

fn build_outcome_cell(outcome: &Result<usize, PlanError>) -> Cell {
    match outcome {
        Ok(n_writes) => Cell::new(format!("{n_writes} writes")).fg(Color::Green),
        Err(error) if error.is_unavailable() => Cell::new(error).fg(Color::DarkYellow),
        Err(error) => Cell::new(error).fg(Color::Red),
    }
}

pub fn build_registers_table(registers: &[(Register, u16)]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Register", "Address", "Raw", "Value"]);
    for (register, value) in registers {
        let meaning = match register {
            Register::Enable => Cell::new(if *value == 0 { "off" } else { "on" }),
            Register::TodayDate | Register::TomorrowDate => {
                Cell::new(format!("{:02}-{:02}", value >> 8, value & 0xFF))
            }
            Register::BuySwitch => match BuySwitchMode::try_from(*value) {
                Ok(mode) => Cell::new(mode),
                Err(error) => Cell::new(error).fg(Color::Red),
            },
            Register::Mask(..) => Cell::new(format!("{value:016b}")),
        };
        table.add_row(vec![
            Cell::new(register),
            Cell::new(register.address()).add_attribute(Attribute::Dim),
            Cell::new(format!("{value:#06X}")).set_alignment(CellAlignment::Right),
            meaning,
        ]);
    }
    table
}
