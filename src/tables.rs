use chrono::{DateTime, Local};
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    core::snapshot::TariffSnapshot,
    quantity::rate::KilowattHourRate,
    statistics::rates::Extreme,
};

const TIME: &str = "%H:%M";

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

#[must_use]
pub fn build_overview_table(
    snapshot: &TariffSnapshot,
    now: DateTime<Local>,
    component: Option<&str>,
) -> Table {
    let today_average = snapshot.day_average(now, 0, component);

    let mut table = new_table();
    table.set_header(vec![
        format!("{} tariff", snapshot.tariff_type()),
        "Price".to_owned(),
        "Window".to_owned(),
    ]);

    let current_bounds = snapshot.current_slot(now).and_then(|slot| {
        Some(format!("{} – {}", slot.start()?.format(TIME), slot.end()?.format(TIME)))
    });
    table.add_row(vec![
        Cell::new("Current price"),
        price_cell(snapshot.current_price(now, component), today_average),
        dim_cell(current_bounds),
    ]);
    if component.is_none() {
        for component in snapshot.components() {
            table.add_row(vec![
                Cell::new(format!("Current price ({component})")),
                price_cell(snapshot.current_price(now, Some(component.as_str())), today_average),
                dim_cell(None),
            ]);
        }
    }
    table.add_row(vec![
        Cell::new("Next change"),
        price_cell(None, None),
        dim_cell(snapshot.next_change(now).map(|at| at.format(TIME).to_string())),
    ]);

    for (label, offset) in [("today", 0_i64), ("tomorrow", 1)] {
        table.add_row(vec![
            Cell::new(format!("Average {label}")),
            price_cell(snapshot.day_average(now, offset, component), None),
            dim_cell(snapshot.day_summary(now, offset, component).map(|summary| {
                format!(
                    "{} … {}, mean {}, {} slots",
                    summary.min, summary.max, summary.average, summary.slot_count,
                )
            })),
        ]);
    }

    for (label, extreme) in [("Cheapest", Extreme::Min), ("Most expensive", Extreme::Max)] {
        for window_size in [2_usize, 4] {
            for (day_label, offset) in [("today", 0_i64), ("tomorrow", 1)] {
                let window = snapshot.extreme_window(now, offset, window_size, extreme, component);
                table.add_row(vec![
                    Cell::new(format!("{label} {window_size} h {day_label}")),
                    price_cell(window.map(|window| window.average), None),
                    dim_cell(window.map(|window| {
                        format!("{} – {}", window.start.format(TIME), window.end.format(TIME))
                    })),
                ]);
            }
        }
    }
    table
}

#[must_use]
pub fn build_membership_table(
    snapshot: &TariffSnapshot,
    now: DateTime<Local>,
    component: Option<&str>,
) -> Table {
    let rows: [(&str, Option<bool>); 9] = [
        ("Cheapest 10 % of today", snapshot.is_in_percentile(now, 0.10, false, component)),
        ("Cheapest 25 % of today", snapshot.is_in_percentile(now, 0.25, false, component)),
        ("Cheapest 50 % of today", snapshot.is_in_percentile(now, 0.50, false, component)),
        ("Most expensive 10 % of today", snapshot.is_in_percentile(now, 0.10, true, component)),
        ("Most expensive 25 % of today", snapshot.is_in_percentile(now, 0.25, true, component)),
        (
            "Inside the cheapest 2 h window",
            snapshot.is_in_extreme_window(now, 2, Extreme::Min, component),
        ),
        (
            "Inside the cheapest 4 h window",
            snapshot.is_in_extreme_window(now, 4, Extreme::Min, component),
        ),
        (
            "Inside the most expensive 2 h window",
            snapshot.is_in_extreme_window(now, 2, Extreme::Max, component),
        ),
        (
            "Inside the most expensive 4 h window",
            snapshot.is_in_extreme_window(now, 4, Extreme::Max, component),
        ),
    ];

    let mut table = new_table();
    table.set_header(vec![format!("{} tariff: now is…", snapshot.tariff_type()), String::new()]);
    for (label, flag) in rows {
        table.add_row(vec![Cell::new(label), flag_cell(flag)]);
    }
    table
}

#[must_use]
pub fn build_slots_table(snapshot: &TariffSnapshot, component: Option<&str>) -> Table {
    let priced = snapshot.price_slots(component);
    let mean_price = (!priced.is_empty()).then(|| {
        priced.iter().map(|slot| slot.value).sum::<KilowattHourRate>() / priced.len() as f64
    });

    let mut table = new_table();
    table.set_header(vec!["Date", "Start", "End", "Price"]);
    for slot in snapshot.slots() {
        let price = slot.price(snapshot.tariff_type(), component).map(KilowattHourRate::from);
        table.add_row(vec![
            dim_cell(slot.start().map(|start| start.format("%b %d").to_string())),
            match slot.start() {
                Some(start) => Cell::new(start.format(TIME)),
                None => dim_cell(None),
            },
            dim_cell(slot.end().map(|end| end.format(TIME).to_string())),
            price_cell(price, mean_price),
        ]);
    }
    table
}

/// Right-aligned price, colored against the reference when one is given.
fn price_cell(value: Option<KilowattHourRate>, reference: Option<KilowattHourRate>) -> Cell {
    let Some(value) = value else {
        return Cell::new("–").set_alignment(CellAlignment::Right).add_attribute(Attribute::Dim);
    };
    let cell = Cell::new(value).set_alignment(CellAlignment::Right);
    match reference {
        Some(reference) if value >= reference => cell.fg(Color::Red),
        Some(_) => cell.fg(Color::Green),
        None => cell,
    }
}

fn dim_cell(content: Option<String>) -> Cell {
    Cell::new(content.unwrap_or_else(|| "–".to_owned())).add_attribute(Attribute::Dim)
}

fn flag_cell(flag: Option<bool>) -> Cell {
    match flag {
        Some(true) => Cell::new("yes").fg(Color::Green),
        Some(false) => Cell::new("no"),
        None => Cell::new("–").add_attribute(Attribute::Dim),
    }
}
