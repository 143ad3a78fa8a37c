//! UI rendering helpers for the terminal user interface.
//!
//! `layout` is shared with the event loop so mouse hits on the seek gauge land
//! on the same rectangle that was drawn.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Clear, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock, time::Duration};

use crate::app::{App, InputMode, NoticeKind};
use crate::config::UiSettings;
use crate::library::CoverArt;
use crate::transport::PlaybackState;

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("j/k", "up/down");
    map.insert("enter", "play selected");
    map.insert("space/p", "play/pause");
    map.insert("s", "stop");
    map.insert("h/l", "prev/next");
    map.insert("0-9", "jump to n*10%");
    map.insert("d", "download URL");
    map.insert("r", "rescan");
    map.insert("q", "quit");
    map
});

const TRANSPORT_KEYS: [&str; 5] = ["space/p", "s", "h/l", "[/]", "0-9"];
const GENERAL_KEYS: [&str; 5] = ["j/k", "enter", "d", "r", "q"];

/// Areas of one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UiLayout {
    pub header: Rect,
    pub tracks: Rect,
    pub cover: Rect,
    pub info: Rect,
    pub progress: Rect,
    pub input: Rect,
    pub footer: Rect,
}

pub fn layout(area: Rect) -> UiLayout {
    let [header, body, progress, input, footer] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(8),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(4),
    ])
    .areas(area);
    let [tracks, side] =
        Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(body);
    let [cover, info] = Layout::vertical([Constraint::Min(4), Constraint::Length(5)]).areas(side);

    UiLayout {
        header,
        tracks,
        cover,
        info,
        progress,
        input,
        footer,
    }
}

/// Fraction of the seek gauge under `column`, or `None` when the gauge has
/// no inner width. Columns outside the bar clamp to its ends.
pub fn gauge_fraction_at(gauge: Rect, column: u16) -> Option<f64> {
    let inner_x = gauge.x.saturating_add(1);
    let inner_w = gauge.width.saturating_sub(2);
    if inner_w == 0 {
        return None;
    }
    let col = column.clamp(inner_x, inner_x + inner_w - 1) - inner_x;
    Some(f64::from(col) / f64::from(inner_w.saturating_sub(1).max(1)))
}

pub fn hits(area: Rect, column: u16, row: u16) -> bool {
    area.contains(Position::new(column, row))
}

/// Format a `Duration` as `m:ss`.
pub fn format_time(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

fn controls_line(keys: &[&str], seek_step_percent: u8, style: Style) -> Vec<Span<'static>> {
    keys.iter()
        .filter_map(|k| {
            if *k == "[/]" {
                Some(format!("[{k}] seek -/+{seek_step_percent}%"))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{k}] {v}"))
            }
        })
        .flat_map(|text| [Span::styled(text, style), Span::raw(" | ")])
        .collect()
}

/// Footer text; transport keys are dimmed while nothing is selected.
fn controls_text(transport_enabled: bool, seek_step_percent: u8) -> Line<'static> {
    let transport_style = if transport_enabled {
        Style::default()
    } else {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM)
    };
    let mut spans = controls_line(&TRANSPORT_KEYS, seek_step_percent, transport_style);
    spans.extend(controls_line(&GENERAL_KEYS, seek_step_percent, Style::default()));
    spans.pop();
    Line::from(spans)
}

/// Render `art` with upper-half blocks: foreground is the top pixel,
/// background the one below, so one cell shows two pixel rows.
pub fn cover_lines(art: &CoverArt, cols: u16, rows: u16) -> Vec<Line<'static>> {
    if cols == 0 || rows == 0 || art.width == 0 || art.height == 0 {
        return Vec::new();
    }
    let scale = (f64::from(art.width) / f64::from(cols))
        .max(f64::from(art.height) / (f64::from(rows) * 2.0))
        .max(1.0);
    let out_w = ((f64::from(art.width) / scale) as u32).max(1);
    let out_h = ((f64::from(art.height) / scale) as u32).max(1);
    let src = |v: u32, limit: u32| ((f64::from(v) * scale) as u32).min(limit - 1);

    (0..out_h)
        .step_by(2)
        .map(|y| {
            let spans: Vec<Span> = (0..out_w)
                .map(|x| {
                    let sx = src(x, art.width);
                    let mut style = Style::default();
                    if let Some([r, g, b]) = art.pixel(sx, src(y, art.height)) {
                        style = style.fg(Color::Rgb(r, g, b));
                    }
                    if y + 1 < out_h {
                        if let Some([r, g, b]) = art.pixel(sx, src(y + 1, art.height)) {
                            style = style.bg(Color::Rgb(r, g, b));
                        }
                    }
                    Span::styled("▀", style)
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width: width.min(r.width),
        height: height.min(r.height),
    }
}

fn left_pad() -> Padding {
    Padding {
        left: 1,
        right: 0,
        top: 0,
        bottom: 0,
    }
}

fn draw_tracks(frame: &mut Frame, app: &App, area: Rect) {
    // Only build items for the visible window, centred on the cursor.
    let total = app.tracks.len();
    let list_height = area.height.saturating_sub(2) as usize;
    let (start, end, cursor_in_view) = if total <= list_height || list_height == 0 {
        (0, total, app.cursor)
    } else {
        let half = list_height / 2;
        let mut start = app.cursor.saturating_sub(half);
        if start + list_height > total {
            start = total - list_height;
        }
        (start, start + list_height, app.cursor - start)
    };

    let items: Vec<ListItem> = (start..end)
        .map(|i| {
            let track = &app.tracks[i];
            if app.status.index == Some(i) {
                ListItem::new(format!("♪ {}", track.display)).bold()
            } else {
                ListItem::new(format!("  {}", track.display))
            }
        })
        .collect();

    let title = format!(" tracks ({}) ", app.current_dir.display());
    let list = List::new(items)
        .block(Block::bordered().title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if total > 0 {
        state.select(Some(cursor_in_view));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_cover(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::bordered().title(" cover ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let art = app
        .current_track()
        .or_else(|| app.cursor_track())
        .and_then(|t| t.cover.as_ref());
    let widget = match art {
        Some(art) => Paragraph::new(cover_lines(art, inner.width, inner.height)),
        None => {
            let pad = usize::from(inner.height.saturating_sub(1) / 2);
            let mut lines = vec![Line::default(); pad];
            lines.push(Line::from("(no cover)").dark_gray());
            Paragraph::new(lines)
        }
    };
    frame.render_widget(widget.alignment(Alignment::Center), inner);
}

fn draw_info(frame: &mut Frame, app: &App, area: Rect) {
    let state = match app.status.state {
        PlaybackState::Playing => "Playing",
        PlaybackState::Paused => "Paused",
        PlaybackState::Stopped => "Stopped",
    };
    let lines = match app.current_track() {
        Some(track) => vec![
            Line::from(track.now_playing()).bold(),
            Line::from(state),
            Line::from(track.path.display().to_string()).dark_gray(),
        ],
        None => vec![Line::from("No track selected").dark_gray()],
    };
    let info = Paragraph::new(lines)
        .block(Block::bordered().padding(left_pad()).title(" now playing "))
        .wrap(Wrap { trim: true });
    frame.render_widget(info, area);
}

fn draw_progress(frame: &mut Frame, app: &App, area: Rect, ui: &UiSettings) {
    let total = app.status.duration;
    let label = match app.seek_preview {
        Some(f) => format!("seek to {}", format_time(total.mul_f64(f))),
        None => format!(
            "{}{}{}",
            format_time(app.status.position),
            ui.time_separator,
            format_time(total)
        ),
    };
    let style = if app.transport_enabled() {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let gauge = Gauge::default()
        .block(Block::bordered().title(" progress "))
        .gauge_style(style)
        .ratio(app.gauge_fraction().clamp(0.0, 1.0))
        .label(label);
    frame.render_widget(gauge, area);
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect) {
    let (title, text) = match (app.mode, &app.downloading) {
        (InputMode::Url, _) => (
            " video URL (enter: download, esc: cancel) ",
            format!("{}_", app.url_input),
        ),
        (InputMode::Browse, Some(url)) => (" download ", format!("Downloading {url} ...")),
        (InputMode::Browse, None) => (" download ", "press d to download a video as MP3".to_string()),
    };
    let mut input = Paragraph::new(text).block(Block::bordered().padding(left_pad()).title(title));
    if app.mode == InputMode::Url {
        input = input.yellow();
    } else if app.is_downloading() {
        input = input.slow_blink();
    } else {
        input = input.dark_gray();
    }
    frame.render_widget(input, area);
}

fn draw_notice(frame: &mut Frame, app: &App, area: Rect) {
    let Some(notice) = &app.notice else {
        return;
    };
    let width = notice
        .message
        .chars()
        .count()
        .max(notice.title.chars().count())
        .saturating_add(6)
        .min(usize::from(u16::MAX)) as u16;
    let popup = centered_rect_sized(width.clamp(30, 72), 7, area);
    frame.render_widget(Clear, popup);

    let color = match notice.kind {
        NoticeKind::Info => Color::Green,
        NoticeKind::Warning => Color::Yellow,
        NoticeKind::Error => Color::Red,
    };
    let body = Paragraph::new(vec![
        Line::from(notice.message.clone()),
        Line::default(),
        Line::from("press any key").dark_gray(),
    ])
    .block(
        Block::bordered()
            .padding(left_pad())
            .border_style(Style::default().fg(color))
            .title(format!(" {} ", notice.title)),
    )
    .wrap(Wrap { trim: true });
    frame.render_widget(body, popup);
}

/// Render the entire UI into `frame`.
pub fn draw(frame: &mut Frame, app: &App, ui_settings: &UiSettings, seek_step_percent: u8) {
    let areas = layout(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::bordered()
                .title(" siffy ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, areas.header);

    draw_tracks(frame, app, areas.tracks);
    draw_cover(frame, app, areas.cover);
    draw_info(frame, app, areas.info);
    draw_progress(frame, app, areas.progress, ui_settings);
    draw_input(frame, app, areas.input);

    let footer = Paragraph::new(controls_text(app.transport_enabled(), seek_step_percent))
        .block(Block::bordered().title(" controls ").padding(left_pad()))
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, areas.footer);

    draw_notice(frame, app, frame.area());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::Track;
    use image::{ImageBuffer, ImageFormat, Rgb};
    use ratatui::{Terminal, backend::TestBackend, buffer::Buffer};
    use std::io::Cursor;
    use std::path::PathBuf;

    fn screen_text(buffer: &Buffer) -> String {
        let area = buffer.area;
        let mut out = String::new();
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn square_art(size: u32) -> CoverArt {
        let buf = ImageBuffer::from_pixel(size, size, Rgb([10u8, 20, 30]));
        let mut png = Cursor::new(Vec::new());
        buf.write_to(&mut png, ImageFormat::Png).unwrap();
        CoverArt::decode(&png.into_inner(), size).unwrap()
    }

    #[test]
    fn time_labels_are_minutes_and_padded_seconds() {
        assert_eq!(format_time(Duration::ZERO), "0:00");
        assert_eq!(format_time(Duration::from_millis(65_900)), "1:05");
        assert_eq!(format_time(Duration::from_secs(3600)), "60:00");
    }

    #[test]
    fn gauge_fraction_maps_columns_inside_the_border() {
        let gauge = Rect::new(0, 0, 12, 3);
        assert_eq!(gauge_fraction_at(gauge, 1), Some(0.0));
        assert_eq!(gauge_fraction_at(gauge, 10), Some(1.0));
        assert_eq!(gauge_fraction_at(gauge, 0), Some(0.0));
        assert_eq!(gauge_fraction_at(gauge, 50), Some(1.0));
        assert_eq!(gauge_fraction_at(Rect::new(0, 0, 2, 3), 1), None);
    }

    #[test]
    fn cover_uses_two_pixel_rows_per_cell() {
        let art = square_art(32);
        let lines = cover_lines(&art, 16, 8);
        assert_eq!(lines.len(), 8);
        assert!(lines.iter().all(|l| l.spans.len() == 16));
        assert_eq!(lines[0].spans[0].style.fg, Some(Color::Rgb(10, 20, 30)));
        assert_eq!(lines[0].spans[0].style.bg, Some(Color::Rgb(10, 20, 30)));

        assert!(cover_lines(&art, 0, 8).is_empty());
    }

    #[test]
    fn layout_keeps_the_gauge_below_the_body() {
        let areas = layout(Rect::new(0, 0, 100, 40));
        assert_eq!(areas.progress.height, 3);
        assert!(areas.progress.y > areas.tracks.y);
        assert!(hits(areas.progress, 50, areas.progress.y + 1));
        assert!(!hits(areas.progress, 50, areas.tracks.y));
    }

    #[test]
    fn renders_placeholder_labels_and_notice() {
        let track = Track {
            path: PathBuf::from("/m/song.mp3"),
            title: "Song".into(),
            artist: Some("Band".into()),
            duration: Some(Duration::from_secs(125)),
            cover: None,
            display: "Band - Song".into(),
        };
        let mut app = App::new(vec![track], PathBuf::from("/m"));
        app.status.index = Some(0);
        app.status.duration = Duration::from_secs(125);
        app.status.position = Duration::from_secs(7);

        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal
            .draw(|f| draw(f, &app, &UiSettings::default(), 5))
            .unwrap();
        let text = screen_text(terminal.backend().buffer());
        assert!(text.contains("(no cover)"));
        assert!(text.contains("0:07 / 2:05"));
        assert!(text.contains("Band - Song"));

        app.show_notice(crate::app::Notice::error("Download failed", "boom"));
        terminal
            .draw(|f| draw(f, &app, &UiSettings::default(), 5))
            .unwrap();
        let text = screen_text(terminal.backend().buffer());
        assert!(text.contains("Download failed"));
        assert!(text.contains("boom"));
    }
}
