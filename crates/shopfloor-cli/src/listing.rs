// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};
use shopfloor_app::{
    CellValue, ColumnFilter, ListControls, ListView, Machine, MachineFault, Order, PageSize,
    Person, ProductionInstruction, QualityControl, Resource, Screen, SortDirection, SortSpec,
    Station, StoreItem, TableRecord, Work, column_index, timestamp,
};
use shopfloor_tui::RecordSource;

use crate::runtime::RecordLookup;

const MAX_COLUMN_WIDTH: usize = 32;

/// `column[:asc|:desc]` as given on the command line, resolved per screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortArg {
    pub column: String,
    pub direction: SortDirection,
}

impl SortArg {
    pub fn parse(raw: &str) -> Result<Self> {
        let (column, direction) = match raw.rsplit_once(':') {
            Some((column, "asc")) => (column, SortDirection::Asc),
            Some((column, "desc")) => (column, SortDirection::Desc),
            Some((_, other)) => {
                bail!("sort direction {other:?} is not asc or desc -- use --sort column:desc")
            }
            None => (raw, SortDirection::Asc),
        };
        let column = column.trim();
        if column.is_empty() {
            bail!("--sort needs a column name, for example --sort name:desc");
        }
        Ok(Self {
            column: column.to_owned(),
            direction,
        })
    }

    fn resolve<R: TableRecord>(&self, screen: Screen) -> Result<SortSpec> {
        let column = column_index::<R>(&self.column).ok_or_else(|| {
            let names: Vec<&str> = R::columns().iter().map(|column| column.field).collect();
            anyhow!(
                "{} has no column {:?}; sort by one of: {}",
                screen.label(),
                self.column,
                names.join(", ")
            )
        })?;
        Ok(SortSpec {
            column,
            direction: self.direction,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub screen: Screen,
    pub query: String,
    pub sort: Option<SortArg>,
    pub page: usize,
    pub page_size: PageSize,
    pub filters: Vec<ColumnFilter>,
}

pub fn render_listing<S: RecordSource>(source: &mut S, request: &ListRequest) -> Result<String> {
    match request.screen {
        Screen::Dashboard => {
            bail!("the dashboard has no rows -- list a screen such as production or machines")
        }
        Screen::Production => {
            let (rows, rejected) = source.fetch_production(&request.filters)?;
            render_rows(rows, rejected, request)
        }
        Screen::Machines => list::<Machine, S>(source, request),
        Screen::Faults => list::<MachineFault, S>(source, request),
        Screen::Stations => list::<Station, S>(source, request),
        Screen::QualityControl => list::<QualityControl, S>(source, request),
        Screen::Orders => list::<Order, S>(source, request),
        Screen::Works => list::<Work, S>(source, request),
        Screen::Persons => list::<Person, S>(source, request),
        Screen::Store => list::<StoreItem, S>(source, request),
    }
}

fn list<R: Resource, S: RecordSource>(source: &mut S, request: &ListRequest) -> Result<String> {
    let (rows, rejected) = source.fetch::<R>(&request.filters)?;
    render_rows(rows, rejected, request)
}

/// The visible page as an aligned table with a `page X/Y` footer.
pub fn render_rows<R: Resource>(
    rows: Vec<R>,
    rejected: usize,
    request: &ListRequest,
) -> Result<String> {
    let sort = request
        .sort
        .as_ref()
        .map(|sort| sort.resolve::<R>(request.screen))
        .transpose()?;
    let view = ListView::with_controls(
        rows,
        ListControls {
            query: request.query.clone(),
            sort,
            page: request.page,
            page_size: request.page_size,
        },
    );
    let slice = view.visible();

    let headers: Vec<String> = R::columns()
        .iter()
        .enumerate()
        .map(|(index, column)| match sort {
            Some(spec) if spec.column == index => {
                let marker = match spec.direction {
                    SortDirection::Asc => "▲",
                    SortDirection::Desc => "▼",
                };
                format!("{} {marker}", column.label)
            }
            _ => column.label.to_owned(),
        })
        .collect();
    let body: Vec<Vec<String>> = slice
        .rows
        .iter()
        .map(|record| record.cells().iter().map(CellValue::display).collect())
        .collect();

    let mut out = format_table(&headers, &body);
    if body.is_empty() {
        out.push_str("(no rows)\n");
    }
    if slice.matched == slice.total {
        out.push_str(&format!(
            "page {}/{} ({} rows)\n",
            slice.page, slice.page_count, slice.matched
        ));
    } else {
        out.push_str(&format!(
            "page {}/{} ({} of {} rows)\n",
            slice.page, slice.page_count, slice.matched, slice.total
        ));
    }
    if rejected > 0 {
        out.push_str(&format!(
            "{rejected} rows skipped: they did not match the expected shape\n"
        ));
    }
    Ok(out)
}

pub fn render_record_for<L: RecordLookup>(
    lookup: &mut L,
    screen: Screen,
    id: i64,
) -> Result<String> {
    match screen {
        Screen::Dashboard => {
            bail!("the dashboard has no records -- pick a list screen with --list")
        }
        Screen::Production => {
            let instruction = lookup.lookup::<ProductionInstruction>(id)?;
            Ok(render_instruction(&instruction))
        }
        Screen::Machines => Ok(render_record(&lookup.lookup::<Machine>(id)?)),
        Screen::Faults => Ok(render_record(&lookup.lookup::<MachineFault>(id)?)),
        Screen::Stations => Ok(render_record(&lookup.lookup::<Station>(id)?)),
        Screen::QualityControl => Ok(render_record(&lookup.lookup::<QualityControl>(id)?)),
        Screen::Orders => Ok(render_record(&lookup.lookup::<Order>(id)?)),
        Screen::Works => Ok(render_record(&lookup.lookup::<Work>(id)?)),
        Screen::Persons => Ok(render_record(&lookup.lookup::<Person>(id)?)),
        Screen::Store => Ok(render_record(&lookup.lookup::<StoreItem>(id)?)),
    }
}

fn render_record<R: TableRecord>(record: &R) -> String {
    let width = R::columns()
        .iter()
        .map(|column| column.label.chars().count())
        .max()
        .unwrap_or(0);
    R::columns()
        .iter()
        .zip(record.cells())
        .map(|(column, cell)| format!("{:<width$}  {}\n", column.label, cell.display()))
        .collect()
}

fn render_instruction(instruction: &ProductionInstruction) -> String {
    let mut out = render_record(instruction);
    if instruction.production_to_machines.is_empty() {
        return out;
    }
    out.push_str("routing:\n");
    for (position, step) in instruction.production_to_machines.iter().enumerate() {
        let machine = if step.machine_name.trim().is_empty() {
            format!("machine {}", step.machine_id)
        } else {
            step.machine_name.clone()
        };
        let mut line = format!("  {}. {machine}  {}", position + 1, step.status.label());
        if let Some(entry) = step.entry_date {
            line.push_str(&format!("  in {}", timestamp::format_display(entry)));
        }
        if let Some(exit) = step.exit_date {
            line.push_str(&format!("  out {}", timestamp::format_display(exit)));
        }
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn format_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|header| header.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    for width in &mut widths {
        *width = (*width).min(MAX_COLUMN_WIDTH);
    }

    let mut out = String::new();
    push_line(&mut out, headers, &widths);
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    push_line(&mut out, &rule, &widths);
    for row in rows {
        push_line(&mut out, row, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", clip(cell, *width)))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

fn clip(cell: &str, width: usize) -> String {
    if cell.chars().count() <= width {
        return cell.to_owned();
    }
    let mut clipped: String = cell.chars().take(width.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}

#[cfg(test)]
mod tests {
    use super::{ListRequest, SortArg, render_listing, render_record_for, render_rows};
    use crate::demo::DemoRuntime;
    use anyhow::Result;
    use shopfloor_app::{ColumnFilter, Machine, PageSize, Screen, SortDirection, filter};

    fn request(screen: Screen) -> ListRequest {
        ListRequest {
            screen,
            query: String::new(),
            sort: None,
            page: 1,
            page_size: PageSize::Ten,
            filters: Vec::new(),
        }
    }

    fn data_lines(out: &str) -> Vec<&str> {
        out.lines()
            .skip(2)
            .take_while(|line| !line.starts_with("page "))
            .collect()
    }

    #[test]
    fn sort_arg_accepts_direction_suffix() -> Result<()> {
        assert_eq!(
            SortArg::parse("name:desc")?,
            SortArg {
                column: "name".to_owned(),
                direction: SortDirection::Desc,
            }
        );
        assert_eq!(SortArg::parse("Qty")?.direction, SortDirection::Asc);
        let error = SortArg::parse("name:up").expect_err("unknown direction should fail");
        assert!(error.to_string().contains("asc or desc"));
        assert!(SortArg::parse(":desc").is_err());
        Ok(())
    }

    #[test]
    fn listing_sorts_and_marks_the_header() -> Result<()> {
        let mut runtime = DemoRuntime::seeded(7);
        let mut names: Vec<String> = runtime
            .dataset()
            .machines
            .iter()
            .map(|machine| machine.name.clone())
            .collect();
        names.sort();

        let out = render_listing(
            &mut runtime,
            &ListRequest {
                sort: Some(SortArg::parse("name:desc")?),
                ..request(Screen::Machines)
            },
        )?;
        let header = out.lines().next().unwrap_or_default();
        assert!(header.contains("Name ▼"));
        let first = data_lines(&out)[0];
        assert!(
            first.contains(names.last().map(String::as_str).unwrap_or_default()),
            "first row {first:?} should hold the last name alphabetically"
        );
        assert!(out.contains(&format!("page 1/1 ({} rows)", names.len())));
        Ok(())
    }

    #[test]
    fn query_narrows_and_footer_counts_matches() -> Result<()> {
        let mut runtime = DemoRuntime::seeded(7);
        let faults = &runtime.dataset().faults;
        let total = faults.len();
        let query = faults
            .first()
            .map(|fault| fault.severity.to_uppercase())
            .expect("seeded data has faults");
        let matching = filter(faults, &query).len();
        assert!(matching > 0, "{query} should match the fault it came from");

        let out = render_listing(
            &mut runtime,
            &ListRequest {
                query,
                page_size: PageSize::Fifty,
                ..request(Screen::Faults)
            },
        )?;
        if matching < total {
            assert!(out.contains(&format!("page 1/1 ({matching} of {total} rows)")));
        } else {
            assert!(out.contains(&format!("page 1/1 ({total} rows)")));
        }
        assert_eq!(data_lines(&out).len(), matching);
        Ok(())
    }

    #[test]
    fn page_past_the_end_clamps_to_the_last_page() -> Result<()> {
        let mut runtime = DemoRuntime::seeded(7);
        let persons = runtime.dataset().persons.len();
        let out = render_listing(
            &mut runtime,
            &ListRequest {
                page: 99,
                ..request(Screen::Persons)
            },
        )?;
        let pages = persons.div_ceil(10);
        assert!(out.contains(&format!("page {pages}/{pages} ({persons} rows)")));
        assert_eq!(data_lines(&out).len(), persons - (pages - 1) * 10);
        Ok(())
    }

    #[test]
    fn column_filters_reach_the_source() -> Result<()> {
        let mut runtime = DemoRuntime::seeded(7);
        let out = render_listing(
            &mut runtime,
            &ListRequest {
                filters: vec![ColumnFilter::new("id", "3")],
                ..request(Screen::Machines)
            },
        )?;
        assert!(out.contains("page 1/1 (1 rows)"));
        Ok(())
    }

    #[test]
    fn unknown_sort_column_lists_the_choices() {
        let mut runtime = DemoRuntime::seeded(7);
        let error = render_listing(
            &mut runtime,
            &ListRequest {
                sort: Some(SortArg {
                    column: "colour".to_owned(),
                    direction: SortDirection::Asc,
                }),
                ..request(Screen::Machines)
            },
        )
        .expect_err("unknown column should fail");
        let message = error.to_string();
        assert!(message.contains("colour"));
        assert!(message.contains("brand"));
    }

    #[test]
    fn dashboard_cannot_be_listed() {
        let mut runtime = DemoRuntime::seeded(7);
        let error = render_listing(&mut runtime, &request(Screen::Dashboard))
            .expect_err("dashboard has no rows");
        assert!(error.to_string().contains("dashboard"));
    }

    #[test]
    fn production_listing_shows_projected_status() -> Result<()> {
        let mut runtime = DemoRuntime::seeded(7);
        let out = render_listing(
            &mut runtime,
            &ListRequest {
                page_size: PageSize::Fifty,
                ..request(Screen::Production)
            },
        )?;
        assert!(out.contains("not started"));
        assert!(out.contains("completed"));
        assert!(out.contains("cancelled"));
        Ok(())
    }

    #[test]
    fn empty_page_and_rejected_rows_are_reported() -> Result<()> {
        let out = render_rows(Vec::<Machine>::new(), 2, &request(Screen::Machines))?;
        assert!(out.contains("(no rows)"));
        assert!(out.contains("page 1/1 (0 rows)"));
        assert!(out.contains("2 rows skipped"));
        Ok(())
    }

    #[test]
    fn long_cells_are_clipped() {
        assert_eq!(super::clip("Hidrolik pres", 8), "Hidroli…");
        assert_eq!(super::clip("Pres", 8), "Pres");
    }

    #[test]
    fn show_renders_fields_and_routing() -> Result<()> {
        let mut runtime = DemoRuntime::seeded(7);
        let machine = render_record_for(&mut runtime, Screen::Machines, 2)?;
        let name = &runtime.dataset().machines[1].name;
        assert!(
            machine
                .lines()
                .any(|line| line.starts_with("Name") && line.ends_with(name.as_str()))
        );

        let instruction = render_record_for(&mut runtime, Screen::Production, 2)?;
        assert!(instruction.contains("routing:"));
        assert!(instruction.contains("  1. "));
        assert!(instruction.contains("in process") || instruction.contains("finished"));
        Ok(())
    }
}
