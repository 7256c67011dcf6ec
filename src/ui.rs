pub mod charting;

use itertools::{EitherOrBoth, Itertools};
use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
    Terminal,
};
use unicode_width::UnicodeWidthStr;

use crate::error::RenderError;
use crate::history::TrendSummary;
use crate::language::LanguageId;
use crate::render::{Renderer, ResultsView, TypingView};
use crate::scoring::ScoreReport;
use crate::ui::charting::{Metric, ACCURACY_BOUNDS};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

pub const LEGEND: &str = "(r)estart / (n)ew / (q)uit";

/// Language of the results screen labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    English,
    Chinese,
}

impl From<LanguageId> for Locale {
    fn from(lang: LanguageId) -> Self {
        match lang {
            LanguageId::Chinese => Locale::Chinese,
            LanguageId::English | LanguageId::Spanish => Locale::English,
        }
    }
}

impl Locale {
    fn legend(&self) -> &'static str {
        match self {
            Locale::English => LEGEND,
            Locale::Chinese => "(r)重新开始 / (n)换一组 / (q)退出",
        }
    }

    fn session_axis(&self) -> &'static str {
        match self {
            Locale::English => "session",
            Locale::Chinese => "场次",
        }
    }

    fn chart_title(&self, metric: Metric) -> &'static str {
        match (self, metric) {
            (Locale::English, Metric::Wpm) => "wpm",
            (Locale::English, Metric::Accuracy) => "accuracy",
            (Locale::Chinese, Metric::Wpm) => "每分钟字数",
            (Locale::Chinese, Metric::Accuracy) => "准确率",
        }
    }
}

struct Palette {
    bold: Style,
    correct: Style,
    incorrect: Style,
    pending: Style,
    cursor: Style,
}

impl Palette {
    fn new() -> Self {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let pending = Style::default().patch(bold).add_modifier(Modifier::DIM);
        Self {
            bold,
            correct: Style::default().patch(bold).fg(Color::Green),
            incorrect: Style::default().patch(bold).fg(Color::Red),
            pending,
            cursor: Style::default().patch(pending).add_modifier(Modifier::UNDERLINED),
        }
    }
}

fn shown(c: char) -> String {
    match c {
        ' ' => "·".to_owned(),
        c => c.to_string(),
    }
}

/// Colour one target line against what was typed for it.
fn line_spans(expected: &str, typed: &str, active: bool, palette: &Palette) -> Line<'static> {
    let mut spans = Vec::with_capacity(expected.len() + 1);
    let mut cursor_placed = !active;

    for pair in expected.chars().zip_longest(typed.chars()) {
        match pair {
            EitherOrBoth::Both(e, t) if e == t => {
                spans.push(Span::styled(e.to_string(), palette.correct))
            }
            EitherOrBoth::Both(_, t) | EitherOrBoth::Right(t) => {
                spans.push(Span::styled(shown(t), palette.incorrect))
            }
            EitherOrBoth::Left(e) if !cursor_placed => {
                cursor_placed = true;
                spans.push(Span::styled(e.to_string(), palette.cursor));
            }
            EitherOrBoth::Left(e) => spans.push(Span::styled(e.to_string(), palette.pending)),
        }
    }
    if !cursor_placed {
        spans.push(Span::styled(" ", palette.cursor));
    }

    Line::from(spans)
}

fn occupied_rows(lines: &[String], max_width: u16) -> u16 {
    let max_width = max_width.max(1) as usize;
    lines
        .iter()
        .map(|l| (l.width().max(1)).div_ceil(max_width) as u16)
        .sum()
}

impl Widget for &TypingView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let palette = Palette::new();
        let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2);
        let prompt_rows = occupied_rows(self.target.lines(), max_chars_per_line);
        let single_rows = prompt_rows as usize == self.target.line_count();

        let time_left_lines = if self.seconds_remaining.is_some() { 2 } else { 0 };
        let padding = area.height.saturating_sub(prompt_rows + time_left_lines) / 2;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(padding),
                Constraint::Length(time_left_lines),
                Constraint::Length(prompt_rows),
                Constraint::Length(padding),
            ])
            .split(area);

        let active = self.active_line();
        let lines = self
            .target
            .lines()
            .iter()
            .enumerate()
            .map(|(idx, expected)| {
                let typed = match self.committed.get(idx) {
                    Some(line) => line.as_str(),
                    None if idx == active => self.buffer,
                    None => "",
                };
                line_spans(expected, typed, idx == active, &palette)
            })
            .collect::<Vec<_>>();

        Paragraph::new(lines)
            .alignment(if single_rows {
                Alignment::Center
            } else {
                Alignment::Left
            })
            .wrap(Wrap { trim: false })
            .render(chunks[2], buf);

        if let Some(secs) = self.seconds_remaining {
            Paragraph::new(Span::styled(format!("{secs:.1}"), palette.pending))
                .alignment(Alignment::Center)
                .render(chunks[1], buf);
        }
    }
}

pub(crate) fn stats_line(report: &ScoreReport, locale: Locale) -> String {
    let r = report;
    match locale {
        Locale::English => format!(
            "{:.0} wpm   {:.0}% acc   {} streak   {}/{} chars   {:.1}s",
            r.wpm, r.accuracy, r.max_streak, r.correct_chars, r.total_chars, r.elapsed_secs
        ),
        Locale::Chinese => format!(
            "每分钟字数 {:.0}   准确率 {:.0}%   最大连击 {}   正确字符数 {}/{}   {:.1}秒",
            r.wpm, r.accuracy, r.max_streak, r.correct_chars, r.total_chars, r.elapsed_secs
        ),
    }
}

pub(crate) fn trend_line(trend: Option<TrendSummary>, locale: Locale) -> String {
    match (trend, locale) {
        (Some(t), Locale::English) => format!(
            "{} sessions   avg {:.1} wpm   best {:.1} wpm   {:.2} sd   avg {:.0}% acc",
            t.sessions, t.mean_wpm, t.best_wpm, t.wpm_std_dev, t.mean_accuracy
        ),
        (Some(t), Locale::Chinese) => format!(
            "{} 场   平均每分钟字数 {:.1}   最佳 {:.1}   标准差 {:.2}   平均准确率 {:.0}%",
            t.sessions, t.mean_wpm, t.best_wpm, t.wpm_std_dev, t.mean_accuracy
        ),
        (None, Locale::English) => "no saved sessions yet".to_string(),
        (None, Locale::Chinese) => "暂无历史记录".to_string(),
    }
}

fn history_chart<'a>(
    points: &'a [(f64, f64)],
    sessions: f64,
    y_bounds: [f64; 2],
    metric: Metric,
    locale: Locale,
    palette: &Palette,
) -> Chart<'a> {
    let datasets = vec![Dataset::default()
        .marker(ratatui::symbols::Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(points)];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title(locale.session_axis())
                .bounds([1.0, sessions])
                .labels(vec![
                    Span::styled("1", palette.bold),
                    Span::styled(charting::format_label(sessions), palette.bold),
                ]),
        )
        .y_axis(
            Axis::default()
                .title(locale.chart_title(metric))
                .bounds(y_bounds)
                .labels(vec![
                    Span::styled(charting::format_label(y_bounds[0]), palette.bold),
                    Span::styled(charting::format_label(y_bounds[1]), palette.bold),
                ]),
        )
}

/// Results view together with the labels it is drawn in.
struct ResultsScreen<'a> {
    view: &'a ResultsView<'a>,
    locale: Locale,
}

impl Widget for ResultsScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Self { view, locale } = self;
        let palette = Palette::new();
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Min(1),    // charts
                Constraint::Length(1), // stats
                Constraint::Length(1), // trend
                Constraint::Length(1), // author
                Constraint::Length(1), // padding
                Constraint::Length(1), // legend
            ])
            .split(area);

        let charts = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[0]);

        let wpm_points = charting::history_points(view.history, Metric::Wpm);
        let (sessions, highest_wpm) = charting::compute_chart_params(&wpm_points, view.report.wpm);
        history_chart(
            &wpm_points,
            sessions,
            [0.0, highest_wpm],
            Metric::Wpm,
            locale,
            &palette,
        )
        .render(charts[0], buf);

        let accuracy_points = charting::history_points(view.history, Metric::Accuracy);
        history_chart(
            &accuracy_points,
            sessions,
            ACCURACY_BOUNDS,
            Metric::Accuracy,
            locale,
            &palette,
        )
        .render(charts[1], buf);

        Paragraph::new(Span::styled(stats_line(view.report, locale), palette.bold))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        Paragraph::new(Span::styled(
            trend_line(TrendSummary::from_entries(view.history), locale),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

        if let Some(author) = view.author {
            Paragraph::new(Span::styled(format!("- {author}"), italic_style))
                .alignment(Alignment::Center)
                .render(chunks[3], buf);
        }

        Paragraph::new(Span::styled(locale.legend(), italic_style)).render(chunks[5], buf);
    }
}

/// Renderer drawing into a ratatui terminal.
pub struct TerminalRenderer<B: Backend> {
    terminal: Terminal<B>,
    locale: Locale,
}

impl<B: Backend> TerminalRenderer<B> {
    pub fn new(terminal: Terminal<B>) -> Self {
        Self {
            terminal,
            locale: Locale::default(),
        }
    }

    /// Label the results screen in the language being typed.
    pub fn with_locale(mut self, locale: impl Into<Locale>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<B> {
        &mut self.terminal
    }
}

impl<B: Backend> Renderer for TerminalRenderer<B> {
    fn render_typing(&mut self, view: &TypingView<'_>) -> Result<(), RenderError> {
        self.terminal.draw(|f| f.render_widget(view, f.area()))?;
        Ok(())
    }

    fn render_results(&mut self, view: &ResultsView<'_>) -> Result<(), RenderError> {
        let locale = self.locale;
        self.terminal
            .draw(|f| f.render_widget(ResultsScreen { view, locale }, f.area()))?;
        Ok(())
    }
}
