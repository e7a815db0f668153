//! Terminal preview of a rendered chart: a bar chart drawn with ratatui that closes
//! on any key.

use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Widget},
    DefaultTerminal,
};
use std::io::{self, IsTerminal};

use crate::chart_export::{format_value, palette, wedge_fractions};
use crate::error::RenderError;
use crate::visualize::{ChartKind, RenderedChart};

// Bar heights are integers; keep two decimals of resolution.
const SCALE: f64 = 100.0;

/// Shows a chart after it has been written to disk.
pub trait ChartViewer {
    fn show(&mut self, chart: &RenderedChart) -> Result<(), RenderError>;
}

/// Skips the display; the PNG file is the only output.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPreview;

impl ChartViewer for NoPreview {
    fn show(&mut self, _chart: &RenderedChart) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Full-screen preview on the alternate screen. Does nothing when stdout is not a terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPreview;

impl ChartViewer for TerminalPreview {
    fn show(&mut self, chart: &RenderedChart) -> Result<(), RenderError> {
        if !io::stdout().is_terminal() {
            tracing::debug!("stdout is not a terminal, skipping preview");
            return Ok(());
        }
        let mut terminal = ratatui::try_init()?;
        let result = wait_for_key(&mut terminal, chart);
        ratatui::restore();
        Ok(result?)
    }
}

fn wait_for_key(terminal: &mut DefaultTerminal, chart: &RenderedChart) -> io::Result<()> {
    loop {
        terminal.draw(|frame| frame.render_widget(ChartPreview::new(chart), frame.area()))?;
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                return Ok(());
            }
        }
    }
}

pub struct ChartPreview<'a> {
    chart: &'a RenderedChart,
}

impl<'a> ChartPreview<'a> {
    pub fn new(chart: &'a RenderedChart) -> Self {
        Self { chart }
    }

    fn colors(&self) -> Vec<Color> {
        palette(self.chart.entries.value_columns.len())
            .into_iter()
            .map(|c| Color::Rgb(c.0, c.1, c.2))
            .collect()
    }

    /// One group per entry, one bar per value column.
    fn grouped(&self, area: Rect) -> BarChart<'a> {
        let entries = &self.chart.entries;
        let colors = self.colors();
        let per_group = entries.value_columns.len().max(1);
        let groups = entries.labels.iter().zip(&entries.values).map(|(label, row)| {
            let bars: Vec<Bar> = row
                .iter()
                .zip(&entries.value_columns)
                .enumerate()
                .map(|(c, (&v, name))| {
                    bar(v, format_value(v))
                        .label(Line::from(name.clone()))
                        .style(Style::default().fg(colors[c % colors.len()]))
                })
                .collect();
            BarGroup::default()
                .label(Line::from(label.clone()))
                .bars(&bars)
        });
        let chart = groups.fold(BarChart::default(), |chart, group| chart.data(group));
        chart
            .bar_width(bar_width(area.width, entries.len() * per_group, entries.len()))
            .bar_gap(0)
            .group_gap(2)
    }

    /// One bar per entry showing its total, or its share for the pie layout.
    fn totals(&self, area: Rect) -> BarChart<'a> {
        let entries = &self.chart.entries;
        let colors = self.colors();
        let shares = if self.chart.kind == ChartKind::Pie {
            wedge_fractions(&entries.labels, &entries.totals).ok()
        } else {
            None
        };
        let bars: Vec<Bar> = entries
            .labels
            .iter()
            .zip(&entries.totals)
            .enumerate()
            .map(|(i, (label, &total))| {
                let text = match &shares {
                    Some(s) => format!("{:.1}%", s[i] * 100.0),
                    None => format_value(total),
                };
                bar(total, text)
                    .label(Line::from(label.clone()))
                    .style(Style::default().fg(colors[i % colors.len()]))
            })
            .collect();
        BarChart::default()
            .data(BarGroup::default().bars(&bars))
            .direction(Direction::Horizontal)
            .bar_width(bar_width(area.height, entries.len(), 1))
            .bar_gap(1)
    }
}

fn bar<'a>(value: f64, text: String) -> Bar<'a> {
    Bar::default()
        .value((value.max(0.0) * SCALE).round() as u64)
        .text_value(text)
}

fn bar_width(span: u16, bars: usize, groups: usize) -> u16 {
    let gaps = groups.saturating_sub(1) * 2 + bars;
    let free = usize::from(span).saturating_sub(gaps);
    (free / bars.max(1)).clamp(1, 9) as u16
}

impl Widget for ChartPreview<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Fill(1),
                Constraint::Length(1),
            ])
            .split(area);

        Paragraph::new(self.chart.kind.title())
            .style(Style::default().add_modifier(Modifier::BOLD))
            .render(layout[0], buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", self.chart.entries.id_column));
        let inner = block.inner(layout[1]);
        block.render(layout[1], buf);
        match self.chart.kind {
            ChartKind::Subplots | ChartKind::GroupedBars => self.grouped(inner).render(inner, buf),
            ChartKind::HorizontalBars | ChartKind::Pie => self.totals(inner).render(inner, buf),
        }

        Paragraph::new(format!(
            "Saved {}. Press any key to return.",
            self.chart.path.display()
        ))
        .style(Style::default().fg(Color::DarkGray))
        .render(layout[2], buf);
    }
}
