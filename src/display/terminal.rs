// src/display/terminal.rs

use std::fmt::Write as FmtWrite;
use std::io::{stdout, Stdout, Write};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{Color, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, disable_raw_mode, enable_raw_mode, BeginSynchronizedUpdate, Clear, ClearType,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
};

use crate::pipeline::{DisplayFrame, DisplaySink, FrameGeometry, InputSource};
use crate::signal::{Key, UserEvent};

const UPPER_HALF_BLOCK: char = '\u{2580}';

/// Where a picture lands on the terminal grid. Each cell shows two pixel rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellLayout {
    pub x0: u16,
    pub y0: u16,
    pub cols: u16,
    pub rows: u16,
}

/// Largest aspect-preserving fit of `frame` into `cols` x `rows` cells.
pub fn fit_cells(frame: FrameGeometry, cols: u16, rows: u16) -> CellLayout {
    if frame.is_empty() || cols == 0 || rows == 0 {
        return CellLayout {
            x0: 0,
            y0: 0,
            cols: 0,
            rows: 0,
        };
    }
    let (fw, fh) = (frame.width as f64, frame.height as f64);
    let scale = (cols as f64 / fw).min(rows as f64 * 2.0 / fh);
    let out_cols = ((fw * scale).floor() as u16).clamp(1, cols);
    let out_rows = ((fh * scale / 2.0).ceil() as u16).clamp(1, rows);
    CellLayout {
        x0: (cols - out_cols) / 2,
        y0: (rows - out_rows) / 2,
        cols: out_cols,
        rows: out_rows,
    }
}

fn sample(frame: &DisplayFrame, layout: &CellLayout, cx: u16, py: u32) -> Color {
    let g = frame.geometry;
    let x = (cx as u64 * g.width as u64 / layout.cols as u64) as u32;
    let y = (py as u64 * g.height as u64 / (layout.rows as u64 * 2)) as u32;
    let [r, gr, b] = frame.pixel(x.min(g.width - 1), y.min(g.height - 1));
    Color::Rgb { r, g: gr, b }
}

/// Appends the escape sequences drawing `frame` into `layout`.
pub fn render_cells(frame: &DisplayFrame, layout: &CellLayout, buf: &mut String) {
    if layout.cols == 0 || frame.geometry.is_empty() {
        return;
    }
    let mut fg = None;
    let mut bg = None;
    for cy in 0..layout.rows {
        let _ = write!(buf, "{}", MoveTo(layout.x0, layout.y0 + cy));
        for cx in 0..layout.cols {
            let top = sample(frame, layout, cx, cy as u32 * 2);
            let bottom = sample(frame, layout, cx, cy as u32 * 2 + 1);
            if fg != Some(top) {
                let _ = write!(buf, "{}", SetForegroundColor(top));
                fg = Some(top);
            }
            if bg != Some(bottom) {
                let _ = write!(buf, "{}", SetBackgroundColor(bottom));
                bg = Some(bottom);
            }
            buf.push(UPPER_HALF_BLOCK);
        }
    }
    let _ = write!(buf, "{}", ResetColor);
}

/// Draws frames with 24-bit colored half blocks on the alternate screen.
/// Dropping it puts the terminal back the way it was.
pub struct TerminalSink {
    out: Stdout,
    draw_buffer: String,
    last_size: Option<(u16, u16)>,
    frames: u64,
    input_taken: bool,
}

impl TerminalSink {
    pub fn new(title: &str) -> std::io::Result<Self> {
        enable_raw_mode()?;
        let mut out = stdout();
        if let Err(err) = execute!(out, EnterAlternateScreen, Hide, SetTitle(title)) {
            let _ = disable_raw_mode();
            return Err(err);
        }
        Ok(Self {
            out,
            draw_buffer: String::with_capacity(1 << 16),
            last_size: None,
            frames: 0,
            input_taken: false,
        })
    }
}

impl DisplaySink for TerminalSink {
    fn present(&mut self, frame: &DisplayFrame) -> anyhow::Result<()> {
        let (cols, rows) = terminal::size()?;
        self.draw_buffer.clear();
        if self.last_size != Some((cols, rows)) {
            let _ = write!(self.draw_buffer, "{}", Clear(ClearType::All));
            self.last_size = Some((cols, rows));
        }

        // bottom row is the status line
        let layout = fit_cells(frame.geometry, cols, rows.saturating_sub(1));
        render_cells(frame, &layout, &mut self.draw_buffer);

        self.frames += 1;
        let _ = write!(
            self.draw_buffer,
            "{}{}frame {} | SPACE pause | Q quit",
            MoveTo(0, rows.saturating_sub(1)),
            Clear(ClearType::CurrentLine),
            self.frames,
        );

        queue!(self.out, BeginSynchronizedUpdate)?;
        self.out.write_all(self.draw_buffer.as_bytes())?;
        queue!(self.out, EndSynchronizedUpdate)?;
        self.out.flush()?;
        Ok(())
    }

    fn take_input(&mut self) -> Option<Box<dyn InputSource>> {
        if self.input_taken {
            return None;
        }
        self.input_taken = true;
        Some(Box::new(CrosstermInput))
    }
}

impl Drop for TerminalSink {
    fn drop(&mut self) {
        let _ = execute!(self.out, ResetColor, Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

/// Keyboard side of the terminal: Space pauses, Q / Esc / Ctrl-C quit.
pub struct CrosstermInput;

pub fn map_key(ev: KeyEvent) -> Option<UserEvent> {
    if ev.kind != KeyEventKind::Press {
        return None;
    }
    let event = match ev.code {
        KeyCode::Char('c') if ev.modifiers.contains(KeyModifiers::CONTROL) => UserEvent::QuitRequest,
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => UserEvent::QuitRequest,
        KeyCode::Char(' ') => UserEvent::KeyPress(Key::Space),
        KeyCode::Char(c) => UserEvent::KeyPress(Key::Char(c)),
        _ => UserEvent::KeyPress(Key::Other),
    };
    Some(event)
}

impl InputSource for CrosstermInput {
    fn poll_input(&mut self, timeout: Duration) -> anyhow::Result<Vec<UserEvent>> {
        let mut events = Vec::new();
        if !event::poll(timeout)? {
            return Ok(events);
        }
        loop {
            if let Event::Key(key) = event::read()? {
                events.extend(map_key(key));
            }
            if !event::poll(Duration::ZERO)? {
                break;
            }
        }
        Ok(events)
    }
}
