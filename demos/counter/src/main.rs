//! Counter - Minimal slice-dispatch example
//!
//! A counter slice mounted once and driven by a terminal render loop:
//! - Slice: reducer, initial state, creators, selectors
//! - Hook: mount once, render when state changed, commit after drawing
//! - Devtools: with `--devtools-log`, every dispatch is appended as JSON
//!
//! Keys: j/Down = decrement, k/Up = increment, r = reset, q = quit

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Flex, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};
use serde::Serialize;
use slice_dispatch::devtools::install_extension;
use slice_dispatch::prelude::*;

#[derive(Parser, Debug)]
#[command(about = "Counter slice rendered in the terminal")]
struct Args {
    /// Append devtools messages to this file, one JSON object per line
    #[arg(long, value_name = "PATH")]
    devtools_log: Option<PathBuf>,

    /// Devtools instance id; drawn from the registry when omitted
    #[arg(long)]
    instance_id: Option<u32>,

    /// Initial count, overriding the slice default
    #[arg(long)]
    start: Option<i64>,
}

// ============================================================================
// Slice - reducer, creators and selectors
// ============================================================================

#[derive(Action, Clone, Debug, Serialize)]
#[action(creators)]
enum CounterAction {
    Increment,
    Decrement,
    Reset,
}

type CounterSlice = SliceDef<i64, CounterAction>;

fn counter_slice() -> CounterSlice {
    SliceDef::new("counter", || 0, |count: &i64, action: &CounterAction| {
        Ok(match action {
            CounterAction::Increment => count + 1,
            CounterAction::Decrement => count - 1,
            CounterAction::Reset => 0,
        })
    })
    .with_actions(
        ActionCreators::new()
            .action("increment", |(): ()| CounterAction::Increment)
            .action("decrement", |(): ()| CounterAction::Decrement)
            .action("reset", |(): ()| CounterAction::Reset),
    )
    .with_selectors(Selectors::new().selector("select_count", |count: &i64| *count))
}

// ============================================================================
// Main - Setup terminal, run render loop, cleanup
// ============================================================================

fn main() -> io::Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.devtools_log {
        install_extension(Arc::new(JsonLinesExtension::new(File::create(path)?)));
    }

    let mut devtools = DevtoolsConfig::default();
    if let Some(id) = args.instance_id {
        devtools = devtools.instance_id(id);
    }
    let mut options = UseSliceOptions::default().with_devtools(devtools);
    if let Some(start) = args.start {
        options = options.with_initial_state(start);
    }

    let hook = SliceHook::mount(Arc::new(counter_slice()), options).map_err(io::Error::other)?;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, hook);

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut hook: SliceHook<CounterSlice>,
) -> io::Result<()> {
    let mut rendered = hook.render();

    loop {
        if hook.needs_render() {
            rendered = hook.render();
        }

        let count: i64 = rendered
            .selectors
            .select("select_count")
            .map_err(io::Error::other)?;
        terminal.draw(|frame| {
            let area = frame.area();

            let [_, center, _] = Layout::vertical([
                Constraint::Fill(1),
                Constraint::Length(5),
                Constraint::Fill(1),
            ])
            .areas(area);

            let [_, center, _] = Layout::horizontal([
                Constraint::Fill(1),
                Constraint::Length(30),
                Constraint::Fill(1),
            ])
            .flex(Flex::Center)
            .areas(center);

            let block = Block::default()
                .title(format!(" Counter #{} ", hook.instance_id()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan));

            let paragraph = Paragraph::new(format!("count is {count}"))
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(paragraph, center);

            let [_, help_area] =
                Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(area);
            let help = Paragraph::new("k/Up: +1  j/Down: -1  r: reset  q: quit")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(help, help_area);
        })?;
        hook.commit();

        // Block until the next key so the loop only redraws after input
        while !event::poll(Duration::from_millis(250))? {}
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let dispatch = &rendered.dispatch;
        let dispatched = match key.code {
            KeyCode::Char('k') | KeyCode::Up => dispatch.call("increment", ()),
            KeyCode::Char('j') | KeyCode::Down => dispatch.call("decrement", ()),
            KeyCode::Char('r') => dispatch.reset(),
            KeyCode::Char('q') | KeyCode::Esc => break,
            _ => continue,
        };
        dispatched.map_err(io::Error::other)?;
    }

    Ok(())
}
