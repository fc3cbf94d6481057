use crate::api::ApiClient;
use crate::chat::SubmitError;
use crate::config::Config;
use crate::dashboard::{Dashboard, ListTab};
use crate::event::{Event, EventHandler};
use crate::ui;
use crate::ui::components::{InputResult, TextInput};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use tracing::{debug, info};

/// Which panel receives key presses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
  #[default]
  Dashboard,
  Chat,
}

/// Main application state
pub struct App {
  config: Config,

  /// Data state for every panel
  dashboard: Dashboard,

  /// Table shown in the bottom panel
  tab: ListTab,

  focus: Focus,

  chat_input: TextInput,

  /// Latest user-facing notice, shown in the footer
  status: Option<String>,

  title: String,

  should_quit: bool,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let api = ApiClient::new(&config.api)?;
    let dashboard = Dashboard::new(api, &config.dashboard);

    Ok(Self {
      title: config.display_title(),
      config,
      dashboard,
      tab: ListTab::default(),
      focus: Focus::default(),
      chat_input: TextInput::new(),
      status: None,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = self.event_loop(&mut terminal).await;

    // Cleanup terminal even when the loop failed
    self.dashboard.shutdown();
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(
    &mut self,
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
  ) -> Result<()> {
    let mut events = EventHandler::new(self.config.dashboard.tick_rate());
    self.dashboard.mount();

    let mut dirty = true;
    while !self.should_quit {
      if dirty {
        terminal.draw(|frame| ui::draw(frame, self))?;
      }

      let Some(event) = events.next().await else {
        break;
      };
      dirty = match event {
        Event::Key(key) => {
          self.handle_key(key);
          true
        }
        Event::Resize => true,
        Event::Tick => false,
      };
      // Settle after every event so key presses never starve the cache
      dirty |= self.dashboard.tick();
      dirty |= self.dashboard.chat().is_pending();
    }

    info!("quitting");
    Ok(())
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    match self.focus {
      Focus::Dashboard => self.handle_dashboard_key(key),
      Focus::Chat => self.handle_chat_key(key),
    }
  }

  fn handle_dashboard_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Char('q') => self.should_quit = true,
      KeyCode::Tab | KeyCode::BackTab => self.tab = self.tab.toggle(),
      KeyCode::Char('n') | KeyCode::Right => {
        if !self.dashboard.next_page(self.tab) {
          debug!(tab = ?self.tab, "no next page");
        }
      }
      KeyCode::Char('p') | KeyCode::Left => {
        self.dashboard.prev_page(self.tab);
      }
      KeyCode::Char('f') => self.dashboard.cycle_filter(self.tab),
      KeyCode::Char('r') => {
        self.status = None;
        self.dashboard.refresh(self.tab);
      }
      KeyCode::Char('c') => self.focus = Focus::Chat,
      _ => {}
    }
  }

  fn handle_chat_key(&mut self, key: KeyEvent) {
    // Input is disabled while a reply is pending
    if self.dashboard.chat().is_pending() && key.code != KeyCode::Esc {
      return;
    }

    match self.chat_input.handle_key(key) {
      InputResult::Submitted(text) => match self.dashboard.chat_mut().submit(&text) {
        Ok(_) => {
          self.status = None;
          self.chat_input.clear();
        }
        Err(SubmitError::Empty) => self.chat_input.clear(),
        Err(e @ SubmitError::Pending) => self.status = Some(e.to_string()),
      },
      InputResult::Cancelled => self.focus = Focus::Dashboard,
      InputResult::Consumed | InputResult::NotHandled => {}
    }
  }

  // Accessors for UI rendering
  pub fn dashboard(&self) -> &Dashboard {
    &self.dashboard
  }

  pub fn tab(&self) -> ListTab {
    self.tab
  }

  pub fn focus(&self) -> Focus {
    self.focus
  }

  pub fn chat_input(&self) -> &TextInput {
    &self.chat_input
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn api_url(&self) -> &str {
    &self.config.api.base_url
  }

  /// Footer notice: the latest local notice, else the first failing panel
  pub fn status(&self) -> Option<String> {
    if let Some(status) = &self.status {
      return Some(status.clone());
    }
    let summary = self.dashboard.summary();
    let logs = self.dashboard.logs();
    summary
      .error
      .map(|e| format!("summary: {}", e))
      .or_else(|| logs.error.map(|e| format!("activity: {}", e)))
      .or_else(|| {
        let chat = self.dashboard.chat();
        chat.last_error().map(|e| format!("assistant: {}", e))
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::chat::Role;
  use crate::config::ApiConfig;

  fn test_app() -> App {
    let config = Config {
      api: ApiConfig {
        base_url: "http://127.0.0.1:9/api".to_string(),
        timeout_secs: 1,
      },
      ..Config::default()
    };
    App::new(config).unwrap()
  }

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
      app.handle_key(key(KeyCode::Char(c)));
    }
  }

  #[test]
  fn test_quit_keys() {
    let mut app = test_app();
    app.handle_key(key(KeyCode::Char('q')));
    assert!(app.should_quit);

    let mut app = test_app();
    app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit);
  }

  #[test]
  fn test_tab_switches_table() {
    let mut app = test_app();
    assert_eq!(app.tab(), ListTab::Payments);
    app.handle_key(key(KeyCode::Tab));
    assert_eq!(app.tab(), ListTab::Invoices);
    app.handle_key(key(KeyCode::Tab));
    assert_eq!(app.tab(), ListTab::Payments);
  }

  #[test]
  fn test_filter_key_cycles_active_tab_only() {
    let mut app = test_app();
    app.handle_key(key(KeyCode::Tab));
    app.handle_key(key(KeyCode::Char('f')));
    assert_eq!(app.dashboard().invoices().filter(), Some("paid"));
    app.handle_key(key(KeyCode::Char('f')));
    assert_eq!(app.dashboard().invoices().filter(), Some("unpaid"));
    assert_eq!(app.dashboard().payments().filter(), None);
  }

  #[test]
  fn test_next_page_needs_loaded_full_page() {
    let mut app = test_app();
    app.handle_key(key(KeyCode::Char('n')));
    assert_eq!(app.dashboard().payments().page(), 1);
  }

  #[tokio::test]
  async fn test_chat_focus_and_submit() {
    let mut app = test_app();
    app.handle_key(key(KeyCode::Char('c')));
    assert_eq!(app.focus(), Focus::Chat);

    // Letters go to the input, not to dashboard shortcuts
    type_text(&mut app, "q?");
    assert!(!app.should_quit);
    assert_eq!(app.chat_input().value(), "q?");

    app.handle_key(key(KeyCode::Enter));
    assert_eq!(app.chat_input().value(), "");
    let messages = app.dashboard().chat().messages();
    assert_eq!(messages.last().map(|m| m.role), Some(Role::User));
    assert_eq!(messages.last().map(|m| m.content.as_str()), Some("q?"));
    assert!(app.dashboard().chat().is_pending());

    // Typing is ignored until the reply arrives
    type_text(&mut app, "more");
    assert_eq!(app.chat_input().value(), "");

    app.handle_key(key(KeyCode::Esc));
    assert_eq!(app.focus(), Focus::Dashboard);
  }

  #[test]
  fn test_blank_chat_submit_is_cleared() {
    let mut app = test_app();
    app.handle_key(key(KeyCode::Char('c')));
    type_text(&mut app, "   ");
    app.handle_key(key(KeyCode::Enter));

    assert_eq!(app.chat_input().value(), "");
    assert_eq!(app.dashboard().chat().messages().len(), 1);
    assert!(!app.dashboard().chat().is_pending());
  }
}
