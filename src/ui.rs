use std::error::Error;
use std::io;

use chrono::Utc;
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, ExecutableCommand};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};

use one_thing::config::Config;
use one_thing::domain::{format_last_done, DEFAULT_ICON};
use one_thing::{KeyValueStore, OneThing, PickOutcome, SessionState, Theme};

// Terminals rarely report their background, so treat "follow system" as dark.
const SYSTEM_PREFERS_DARK: bool = true;

pub fn run_home<S: KeyValueStore>(app: &mut OneThing<S>, config: &Config) -> Result<(), Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let result = run_event_loop(&mut terminal, app, config);
	app.cancel_reset();

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop<S: KeyValueStore>(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	app: &mut OneThing<S>,
	config: &Config,
) -> Result<(), Box<dyn Error>> {
	let mut screen = Screen::default();

	loop {
		app.tick();
		screen.clamp_selection(app.tasks().len());
		let palette = Palette::for_theme(app.effective_theme(SYSTEM_PREFERS_DARK));
		terminal.draw(|frame| draw(frame, &screen, app, &palette))?;

		if event::poll(config.tick())? {
			if let CEvent::Key(key) = event::read()? {
				if key.kind != KeyEventKind::Press {
					continue;
				}

				if handle_key(&mut screen, key.code, app) {
					break;
				}
			}
		}
	}

	Ok(())
}

fn handle_key<S: KeyValueStore>(screen: &mut Screen, code: KeyCode, app: &mut OneThing<S>) -> bool {
	match std::mem::replace(&mut screen.mode, InputMode::Normal) {
		InputMode::Normal => match screen.view {
			View::Home => handle_home_key(screen, code, app),
			View::Settings => handle_settings_key(screen, code, app),
		},
		InputMode::Prompt(prompt) => {
			handle_prompt_key(screen, prompt, code, app);
			false
		}
		InputMode::ConfirmDelete { id, title } => {
			handle_confirm_key(screen, id, title, code, app);
			false
		}
	}
}

fn handle_home_key<S: KeyValueStore>(screen: &mut Screen, code: KeyCode, app: &mut OneThing<S>) -> bool {
	match code {
		KeyCode::Char('q') | KeyCode::Esc => return true,
		KeyCode::Char(' ') | KeyCode::Enter => match app.session().state() {
			SessionState::Idle => screen.status = pick_status(app.pick()),
			SessionState::Active => {
				screen.status = match app.complete() {
					Ok(_) => String::new(),
					Err(err) => format!("error: {err}"),
				};
			}
			SessionState::Completing | SessionState::Completed => {}
		},
		KeyCode::Char('s') => {
			if app.session().state() == SessionState::Active {
				screen.status = pick_status(app.skip());
			}
		}
		KeyCode::Char('l') => {
			screen.view = View::Settings;
			screen.status = String::new();
		}
		KeyCode::Char('t') => {
			screen.status = match app.toggle_theme(SYSTEM_PREFERS_DARK) {
				Ok(theme) => format!("{} theme", theme.as_str()),
				Err(err) => format!("error: {err}"),
			};
		}
		_ => {}
	}

	false
}

fn pick_status(outcome: one_thing::Result<PickOutcome>) -> String {
	match outcome {
		Ok(PickOutcome::Picked(_)) => String::new(),
		Ok(PickOutcome::NothingAvailable) => "Nothing to show: switch a task on in the list (l)".to_string(),
		Err(err) => format!("error: {err}"),
	}
}

fn handle_settings_key<S: KeyValueStore>(screen: &mut Screen, code: KeyCode, app: &mut OneThing<S>) -> bool {
	let selected = app.tasks().get(screen.selected).cloned();

	match code {
		KeyCode::Char('q') => return true,
		KeyCode::Esc | KeyCode::Char('l') => {
			screen.view = View::Home;
			screen.status = String::new();
		}
		KeyCode::Up | KeyCode::Char('k') => {
			screen.selected = screen.selected.saturating_sub(1);
		}
		KeyCode::Down | KeyCode::Char('j') => {
			screen.selected = screen.selected.saturating_add(1);
			screen.clamp_selection(app.tasks().len());
		}
		KeyCode::Char(' ') | KeyCode::Enter => {
			if let Some(task) = selected {
				screen.status = match app.toggle_task_active(&task.id) {
					Ok(true) => format!("{} is on", task.title),
					Ok(false) => format!("{} is off", task.title),
					Err(err) => format!("error: {err}"),
				};
			}
		}
		KeyCode::Char('d') => {
			if let Some(task) = selected {
				screen.mode = InputMode::ConfirmDelete {
					id: task.id,
					title: task.title,
				};
			}
		}
		KeyCode::Char('a') => {
			screen.mode = InputMode::Prompt(PromptState::new("New small thing", PromptKind::Title));
		}
		_ => {}
	}

	false
}

fn handle_prompt_key<S: KeyValueStore>(screen: &mut Screen, mut prompt: PromptState, code: KeyCode, app: &mut OneThing<S>) {
	match code {
		KeyCode::Esc => {
			screen.status = "Input cancelled".to_string();
			return;
		}
		KeyCode::Backspace => {
			prompt.input.pop();
		}
		KeyCode::Char(value) => {
			prompt.input.push(value);
		}
		KeyCode::Enter => match prompt.kind {
			PromptKind::Title => {
				if prompt.input.trim().is_empty() {
					screen.status = "error: title is required".to_string();
				} else {
					let next = PromptState::new(format!("Icon (blank for {DEFAULT_ICON})"), PromptKind::Icon {
						title: prompt.input,
					});
					screen.mode = InputMode::Prompt(next);
					return;
				}
			}
			PromptKind::Icon { ref title } => {
				match app.add_task(title, &prompt.input) {
					Ok(task) => {
						screen.status = format!("added {}", task.label());
						screen.selected = app.tasks().len().saturating_sub(1);
					}
					Err(err) => screen.status = format!("error: {err}"),
				}
				return;
			}
		},
		_ => {}
	}

	screen.mode = InputMode::Prompt(prompt);
}

fn handle_confirm_key<S: KeyValueStore>(screen: &mut Screen, id: String, title: String, code: KeyCode, app: &mut OneThing<S>) {
	match code {
		KeyCode::Char('y') | KeyCode::Char('Y') => {
			screen.status = match app.remove_task(&id) {
				Ok(_) => format!("deleted {title}"),
				Err(err) => format!("error: {err}"),
			};
			screen.clamp_selection(app.tasks().len());
		}
		KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
			screen.status = "Kept it".to_string();
		}
		_ => {
			screen.mode = InputMode::ConfirmDelete { id, title };
		}
	}
}

fn draw<S: KeyValueStore>(frame: &mut Frame, screen: &Screen, app: &OneThing<S>, palette: &Palette) {
	frame.render_widget(Block::default().style(palette.base), frame.area());

	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Min(10), Constraint::Length(4)])
		.split(frame.area());

	match screen.view {
		View::Home => render_home(frame, layout[0], app, palette),
		View::Settings => render_settings(frame, layout[0], screen, app, palette),
	}
	render_footer(frame, layout[1], screen, palette);

	if let InputMode::ConfirmDelete { title, .. } = &screen.mode {
		render_confirm_popup(frame, title, palette);
	}
}

fn render_home<S: KeyValueStore>(frame: &mut Frame, area: Rect, app: &OneThing<S>, palette: &Palette) {
	let snapshot = app.session_state();
	let lines = match snapshot.state {
		SessionState::Idle => vec![
			Line::from(""),
			Line::from(Span::styled("⚡", palette.accent)),
			Line::from(""),
			Line::from(Span::styled("one small thing", palette.muted)),
			Line::from(Span::styled("press space", palette.muted)),
		],
		SessionState::Active | SessionState::Completing => match app.current_card() {
			Some(card) => {
				let last_done = card
					.last_completed_at
					.map(|at| format!("last: {}", format_last_done(at, Utc::now())))
					.unwrap_or_default();
				vec![
					Line::from(""),
					Line::from(card.task.icon.clone()),
					Line::from(""),
					Line::from(Span::styled(card.task.title.clone(), palette.title)),
					Line::from(Span::styled(last_done, palette.muted)),
					Line::from(""),
					Line::from(Span::styled("[space] done    [s] another one", palette.accent)),
				]
			}
			None => Vec::new(),
		},
		SessionState::Completed => vec![
			Line::from(""),
			Line::from(Span::styled("✓", palette.success)),
			Line::from(""),
			Line::from(Span::styled(snapshot.feedback_message, palette.title)),
			Line::from(Span::styled("Rest your mind.", palette.muted)),
		],
	};

	let card_area = centered_rect(60, 60, area);
	let card = Paragraph::new(lines)
		.alignment(Alignment::Center)
		.block(Block::default().borders(Borders::ALL).border_style(palette.border));
	frame.render_widget(card, card_area);
}

fn render_settings<S: KeyValueStore>(frame: &mut Frame, area: Rect, screen: &Screen, app: &OneThing<S>, palette: &Palette) {
	let items = if app.tasks().is_empty() {
		vec![ListItem::new("(no tasks, press a to add one)")]
	} else {
		app.tasks()
			.iter()
			.map(|task| {
				let (marker, style) = if task.is_active {
					("●", palette.base)
				} else {
					("○", palette.muted)
				};
				ListItem::new(format!("{marker} {}", task.label())).style(style)
			})
			.collect::<Vec<_>>()
	};

	let list = List::new(items)
		.block(
			Block::default()
				.borders(Borders::ALL)
				.border_style(palette.border)
				.title(format!("Small things ({} on)", app.active_count())),
		)
		.highlight_symbol(">> ")
		.highlight_style(palette.highlight);

	let mut state = ListState::default();
	if !app.tasks().is_empty() {
		state.select(Some(screen.selected.min(app.tasks().len() - 1)));
	}
	frame.render_stateful_widget(list, area, &mut state);
}

fn render_footer(frame: &mut Frame, area: Rect, screen: &Screen, palette: &Palette) {
	let footer_lines = match &screen.mode {
		InputMode::Prompt(prompt) => vec![
			Line::from(prompt.title.clone()),
			Line::from(format!("> {}", prompt.input)),
			Line::from("Enter submit | Esc cancel"),
		],
		InputMode::Normal | InputMode::ConfirmDelete { .. } => {
			let keys = match screen.view {
				View::Home => "space pick/done | s another one | l list | t theme | q quit",
				View::Settings => "j/k move | space on/off | a add | d delete | Esc back | q quit",
			};
			vec![Line::from(keys), Line::from(screen.status.clone())]
		}
	};

	let footer = Paragraph::new(footer_lines).block(
		Block::default()
			.borders(Borders::ALL)
			.border_style(palette.border)
			.title("Shortcuts"),
	);
	frame.render_widget(footer, area);
}

fn render_confirm_popup(frame: &mut Frame, title: &str, palette: &Palette) {
	let area = centered_rect(50, 20, frame.area());
	frame.render_widget(Clear, area);

	let popup = Paragraph::new(vec![
		Line::from(format!("Delete \"{title}\"?")),
		Line::from(""),
		Line::from("y delete | n keep"),
	])
	.alignment(Alignment::Center)
	.block(Block::default().borders(Borders::ALL).border_style(palette.border).title("Confirm"));
	frame.render_widget(popup, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
	let popup_layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Percentage((100 - percent_y) / 2),
			Constraint::Percentage(percent_y),
			Constraint::Percentage((100 - percent_y) / 2),
		])
		.split(area);
	Layout::default()
		.direction(Direction::Horizontal)
		.constraints([
			Constraint::Percentage((100 - percent_x) / 2),
			Constraint::Percentage(percent_x),
			Constraint::Percentage((100 - percent_x) / 2),
		])
		.split(popup_layout[1])[1]
}

struct Palette {
	base: Style,
	muted: Style,
	title: Style,
	accent: Style,
	success: Style,
	border: Style,
	highlight: Style,
}

impl Palette {
	fn for_theme(theme: Theme) -> Self {
		match theme {
			Theme::Dark => Self {
				base: Style::default().fg(Color::Rgb(231, 229, 228)).bg(Color::Rgb(28, 25, 23)),
				muted: Style::default().fg(Color::Rgb(120, 113, 108)),
				title: Style::default().fg(Color::Rgb(245, 245, 244)).add_modifier(Modifier::BOLD),
				accent: Style::default().fg(Color::Rgb(168, 162, 158)),
				success: Style::default().fg(Color::LightGreen).add_modifier(Modifier::BOLD),
				border: Style::default().fg(Color::Rgb(68, 64, 60)),
				highlight: Style::default().bg(Color::Rgb(41, 37, 36)),
			},
			Theme::Light => Self {
				base: Style::default().fg(Color::Rgb(41, 37, 36)).bg(Color::Rgb(245, 245, 244)),
				muted: Style::default().fg(Color::Rgb(168, 162, 158)),
				title: Style::default().fg(Color::Rgb(28, 25, 23)).add_modifier(Modifier::BOLD),
				accent: Style::default().fg(Color::Rgb(87, 83, 78)),
				success: Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
				border: Style::default().fg(Color::Rgb(214, 211, 209)),
				highlight: Style::default().bg(Color::Rgb(231, 229, 228)),
			},
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
	Home,
	Settings,
}

#[derive(Debug, Clone)]
enum PromptKind {
	Title,
	Icon { title: String },
}

#[derive(Debug, Clone)]
struct PromptState {
	title: String,
	input: String,
	kind: PromptKind,
}

impl PromptState {
	fn new(title: impl Into<String>, kind: PromptKind) -> Self {
		Self {
			title: title.into(),
			input: String::new(),
			kind,
		}
	}
}

#[derive(Debug, Clone)]
enum InputMode {
	Normal,
	Prompt(PromptState),
	ConfirmDelete { id: String, title: String },
}

struct Screen {
	view: View,
	mode: InputMode,
	selected: usize,
	status: String,
}

impl Default for Screen {
	fn default() -> Self {
		Self {
			view: View::Home,
			mode: InputMode::Normal,
			selected: 0,
			status: String::new(),
		}
	}
}

impl Screen {
	fn clamp_selection(&mut self, len: usize) {
		self.selected = self.selected.min(len.saturating_sub(1));
	}
}
