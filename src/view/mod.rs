//! Terminal shell (impure)
//!
//! Owns the terminal, turns key and mouse events into reader navigation, and draws
//! whatever scene the reader produces each frame.

mod reader_view;
mod styles;

pub use reader_view::{truncate_to_width, CellMetrics, ReaderView, StatusLine};
pub use styles::{ColorConfig, ReaderStyles};

use crate::reader::{Reader, RenderMode};
use crate::view_state::{Scene, ScrollBehavior, ScrollSurface, ScrollToOptions};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Layout, Rect},
    Terminal,
};
use std::io::{self, Stdout};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Longest wait for input before the next frame.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Lines scrolled per mouse wheel notch.
const WHEEL_LINES: f32 = 3.0;

/// Font size change per zoom key press.
const ZOOM_STEP: f32 = 1.0;

/// Errors that can occur during TUI operations
#[derive(Debug, Error)]
pub enum TuiError {
    /// IO error during terminal operations
    #[error("Terminal IO error: {0}")]
    Io(#[from] io::Error),
}

/// Main TUI application
///
/// Generic over backend to support testing with TestBackend
pub struct TuiApp<B>
where
    B: Backend,
{
    terminal: Terminal<B>,
    reader: Reader,
    metrics: CellMetrics,
    styles: ReaderStyles,
    scene: Scene,
}

impl<B> TuiApp<B>
where
    B: Backend,
{
    /// Wrap `reader` in a TUI drawing to `terminal`.
    ///
    /// Cell metrics are taken from the reader's starting font and stay fixed, so a
    /// zoom changes how much text fits on a line rather than the terminal grid.
    pub fn new(terminal: Terminal<B>, reader: Reader, styles: ReaderStyles) -> Result<Self, TuiError> {
        let metrics = CellMetrics::from_font(reader.font());
        let mut app = Self {
            terminal,
            reader,
            metrics,
            styles,
            scene: Scene::default(),
        };
        let size = app.terminal.size()?;
        app.handle_resize(size.width, size.height);
        app.reader.scheduler().request_redraw();
        Ok(app)
    }

    /// The reader being driven.
    pub fn reader(&self) -> &Reader {
        &self.reader
    }

    /// Mutable access to the reader.
    pub fn reader_mut(&mut self) -> &mut Reader {
        &mut self.reader
    }

    /// The terminal, for inspecting a test backend.
    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    /// Run until the user quits.
    ///
    /// Every iteration produces a frame, waits briefly for input, then yields so
    /// background loads on the `LocalSet` can make progress.
    pub async fn run(&mut self) -> Result<(), TuiError> {
        loop {
            self.tick(Instant::now())?;
            if event::poll(FRAME_INTERVAL)? {
                let quit = match event::read()? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Mouse(mouse) => {
                        self.handle_mouse(mouse);
                        false
                    }
                    Event::Resize(width, height) => {
                        self.handle_resize(width, height);
                        false
                    }
                    _ => false,
                };
                if quit {
                    return Ok(());
                }
            }
            tokio::task::yield_now().await;
        }
    }

    /// Produce a frame and draw it if the reader had anything new.
    pub fn tick(&mut self, now: Instant) -> Result<(), TuiError> {
        if let Some(scene) = self.reader.frame(now) {
            self.scene = scene;
            self.draw()?;
        }
        Ok(())
    }

    /// Apply a key press. Returns true when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind == KeyEventKind::Release {
            return false;
        }
        let line = self.metrics.line_px();
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Down | KeyCode::Char('j') => self.reader.scroll_by(line),
            KeyCode::Up | KeyCode::Char('k') => self.reader.scroll_by(-line),
            KeyCode::PageDown | KeyCode::Char(' ') => {
                let page = self.page_px();
                self.reader.scroll_by(page);
            }
            KeyCode::PageUp => {
                let page = self.page_px();
                self.reader.scroll_by(-page);
            }
            KeyCode::Char('g') | KeyCode::Home => self.reader.scroll_to_top(ScrollBehavior::Smooth),
            KeyCode::Char('n') => self.reader.step_chapter(1, ScrollToOptions::default()),
            KeyCode::Char('p') => self.reader.step_chapter(-1, ScrollToOptions::default()),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let size = self.reader.font().body_size + ZOOM_STEP;
                self.reader.set_font_size(size);
            }
            KeyCode::Char('-') => {
                let size = self.reader.font().body_size - ZOOM_STEP;
                self.reader.set_font_size(size);
            }
            _ => {}
        }
        false
    }

    /// Apply a mouse event. Only the wheel is used.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let delta = WHEEL_LINES * self.metrics.line_px();
        match mouse.kind {
            MouseEventKind::ScrollDown => self.reader.scroll_by(delta),
            MouseEventKind::ScrollUp => self.reader.scroll_by(-delta),
            _ => {}
        }
    }

    /// Resize the reading surface to the terminal size minus the status line.
    pub fn handle_resize(&mut self, width: u16, height: u16) {
        let (text_area, _) = split_areas(Rect::new(0, 0, width.max(1), height));
        let viewport = self.metrics.viewport(text_area.width, text_area.height);
        debug!(width, height, ?viewport, "Terminal resized");
        self.reader.set_viewport(viewport);
    }

    fn page_px(&self) -> f32 {
        self.reader
            .viewport()
            .content_box(self.reader.settings().padding)
            .height
    }

    /// Status line text: mode and chapter on the left, position on the right.
    pub fn status(&self) -> (String, String) {
        let mode = match self.reader.mode() {
            RenderMode::Paginated => "PAGED",
            RenderMode::Continuous => "SCROLL",
        };
        let title = self
            .reader
            .current_chapter()
            .map(|c| c.title.as_str())
            .unwrap_or("");
        let left = format!(" {mode} │ {title}");

        let total = self.reader.chapters().len();
        let chapter = self
            .reader
            .current_chapter()
            .and_then(|c| self.reader.chapters().iter().position(|x| x.id == c.id))
            .map(|i| i + 1)
            .unwrap_or(0);
        let size = self.reader.font().body_size;
        let position = match self.reader.current_scroll_surface() {
            ScrollSurface::Paginated { pointer, .. } => {
                let pages = self
                    .reader
                    .paginated()
                    .and_then(|r| r.page_count(pointer.chapter_index))
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "?".to_string());
                format!("p. {}/{pages}", pointer.page_index + 1)
            }
            surface => {
                let fraction = surface.fraction().unwrap_or(0.0);
                format!("{:.0}%", fraction * 100.0)
            }
        };
        let right = format!("ch. {chapter}/{total}  {position}  {size:.0}px ");
        (left, right)
    }

    fn draw(&mut self) -> Result<(), TuiError> {
        let (left, right) = self.status();
        let chapters = self.reader.chapters();
        let padding = self.reader.settings().padding;
        let scene = &self.scene;
        let metrics = self.metrics;
        let styles = &self.styles;

        self.terminal.draw(|frame| {
            let (text_area, status_area) = split_areas(frame.area());
            frame.render_widget(
                ReaderView::new(scene, chapters, metrics, padding, styles),
                text_area,
            );
            frame.render_widget(StatusLine::new(&left, &right, styles), status_area);
        })?;
        Ok(())
    }
}

/// Text area above, one-row status line below.
fn split_areas(area: Rect) -> (Rect, Rect) {
    let [text, status] = Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);
    (text, status)
}

/// Take over the terminal, run `reader` until the user quits, then restore it.
///
/// Must run inside a tokio `LocalSet`.
pub async fn run_reader(reader: Reader) -> Result<(), TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(event::EnableMouseCapture)?;
    let terminal: Terminal<CrosstermBackend<Stdout>> = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = match TuiApp::new(terminal, reader, ReaderStyles::default()) {
        Ok(mut app) => app.run().await,
        Err(err) => Err(err),
    };

    // Always restore terminal state
    restore_terminal()?;
    result
}

/// Restore terminal to normal state
///
/// Disables raw mode, mouse capture, and leaves alternate screen
fn restore_terminal() -> Result<(), TuiError> {
    disable_raw_mode()?;
    io::stdout().execute(event::DisableMouseCapture)?;
    io::stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
