mod app;
mod config;
mod discovery;
mod event;
mod logger;
mod model;
mod processor;
mod state;
mod ui;

use anyhow::{Context, Result};
use clap::Command;
use crossterm::ExecutableCommand;
use crossterm::event::{self as term_event, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::prelude::*;
use std::io::{Stdout, stdout};
use std::time::{Duration, Instant};

use crate::app::App;
use crate::config::CONFIG;

type Backend = CrosstermBackend<Stdout>;

/// 原始模式 + 备用屏幕的终端会话，drop 时（包括 panic 展开）恢复终端
struct Tui {
    terminal: Terminal<Backend>,
}

impl Tui {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("无法进入终端原始模式")?;
        let mut out = stdout();
        out.execute(EnterAlternateScreen)?;
        out.execute(EnableMouseCapture)?;
        let terminal = Terminal::new(CrosstermBackend::new(out))?;
        Ok(Self { terminal })
    }

    fn draw(&mut self, app: &mut App) -> Result<()> {
        let size = self.terminal.size()?;
        app.terminal_size = Rect::new(0, 0, size.width, size.height);
        self.terminal.draw(|frame| ui::render(frame, app))?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut out = stdout();
        let _ = out.execute(DisableMouseCapture);
        let _ = out.execute(LeaveAlternateScreen);
    }
}

fn cli() -> Command {
    Command::new("infini_converter")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Find files by extension and batch-process them with an external program")
        .long_about(
            "Interactive terminal front-end: pick an input directory and extensions, \
             search, then run an external program on each file. \
             Settings live in ~/.infini_converter/config.json.",
        )
}

fn main() -> Result<()> {
    cli().get_matches();

    let mut app = App::new().context("创建应用失败")?;
    let mut tui = Tui::enter()?;
    event_loop(&mut tui, &mut app).context("运行应用失败")
}

fn dispatch(app: &mut App, event: Event) {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => event::handle_key(app, key.code),
        Event::Mouse(mouse) => event::handle_mouse(app, mouse),
        Event::Resize(width, height) => app.terminal_size = Rect::new(0, 0, width, height),
        _ => {}
    }
}

/// 每个 tick 排空一次后台处理消息；其余时间等待终端输入
fn event_loop(tui: &mut Tui, app: &mut App) -> Result<()> {
    let tick = Duration::from_millis(CONFIG.tick_rate_ms);
    let mut next_tick = Instant::now() + tick;

    while !app.should_quit {
        tui.draw(app)?;

        let wait = next_tick.saturating_duration_since(Instant::now());
        if term_event::poll(wait)? {
            dispatch(app, term_event::read()?);
        }

        if Instant::now() >= next_tick {
            app.poll_processing();
            next_tick = Instant::now() + tick;
        }
    }
    Ok(())
}
