// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::forms::FormKind;
use crate::model::Screen;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppMode {
    Nav,
    Search,
    Help,
    ConfirmDelete,
    Form(FormKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeKind {
    Info,
    Success,
    Failure,
}

/// Transient status-line message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Failure,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub mode: AppMode,
    pub active_screen: Screen,
    pub notice: Option<Notice>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::Nav,
            active_screen: Screen::Dashboard,
            notice: None,
        }
    }
}

impl AppState {
    pub fn starting_on(screen: Screen) -> Self {
        Self {
            active_screen: screen,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    NextScreen,
    PrevScreen,
    OpenScreen(Screen),
    OpenSearch,
    OpenHelp,
    RequestDelete,
    OpenForm(FormKind),
    ExitToNav,
    Inform(String),
    /// A write the server accepted. The active screen is refetched.
    WriteSucceeded(String),
    /// A fetch or write that failed. Loaded rows stay as they were.
    OperationFailed(String),
    ClearNotice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ModeChanged(AppMode),
    ScreenChanged(Screen),
    NoticeShown(Notice),
    NoticeCleared,
    RefetchRequested(Screen),
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::NextScreen => self.rotate_screen(1),
            AppCommand::PrevScreen => self.rotate_screen(-1),
            AppCommand::OpenScreen(screen) => {
                if screen == self.active_screen {
                    return Vec::new();
                }
                self.active_screen = screen;
                vec![AppEvent::ScreenChanged(screen)]
            }
            AppCommand::OpenSearch => self.enter_mode(AppMode::Search),
            AppCommand::OpenHelp => self.enter_mode(AppMode::Help),
            AppCommand::RequestDelete => {
                if self.active_screen == Screen::Dashboard {
                    return vec![self.show(Notice::info("nothing to delete on the dashboard"))];
                }
                let mut events = self.enter_mode(AppMode::ConfirmDelete);
                events.push(self.show(Notice::info("delete selected row? y/n")));
                events
            }
            AppCommand::OpenForm(kind) => self.enter_mode(AppMode::Form(kind)),
            AppCommand::ExitToNav => self.enter_mode(AppMode::Nav),
            AppCommand::Inform(message) => vec![self.show(Notice::info(message))],
            AppCommand::WriteSucceeded(message) => {
                let mut events = self.enter_mode(AppMode::Nav);
                events.push(self.show(Notice::success(message)));
                events.push(AppEvent::RefetchRequested(self.active_screen));
                events
            }
            AppCommand::OperationFailed(message) => {
                let mut events = self.enter_mode(AppMode::Nav);
                events.push(self.show(Notice::failure(message)));
                events
            }
            AppCommand::ClearNotice => {
                if self.notice.take().is_none() {
                    return Vec::new();
                }
                vec![AppEvent::NoticeCleared]
            }
        }
    }

    fn enter_mode(&mut self, mode: AppMode) -> Vec<AppEvent> {
        if self.mode == mode {
            return Vec::new();
        }
        self.mode = mode;
        vec![AppEvent::ModeChanged(mode)]
    }

    fn rotate_screen(&mut self, delta: isize) -> Vec<AppEvent> {
        let screens = Screen::ALL;
        let current = screens
            .iter()
            .position(|screen| *screen == self.active_screen)
            .unwrap_or(0) as isize;
        let len = screens.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.active_screen = screens[next];
        vec![AppEvent::ScreenChanged(self.active_screen)]
    }

    fn show(&mut self, notice: Notice) -> AppEvent {
        self.notice = Some(notice.clone());
        AppEvent::NoticeShown(notice)
    }
}

#[cfg(test)]
mod tests {
    use super::{AppCommand, AppEvent, AppMode, AppState, Notice, NoticeKind};
    use crate::forms::FormKind;
    use crate::model::Screen;

    #[test]
    fn screen_rotation_wraps() {
        let mut state = AppState::starting_on(Screen::Store);

        let events = state.dispatch(AppCommand::NextScreen);
        assert_eq!(state.active_screen, Screen::Dashboard);
        assert_eq!(events, vec![AppEvent::ScreenChanged(Screen::Dashboard)]);

        state.dispatch(AppCommand::PrevScreen);
        assert_eq!(state.active_screen, Screen::Store);
    }

    #[test]
    fn opening_current_screen_is_quiet() {
        let mut state = AppState::starting_on(Screen::Faults);
        assert!(state.dispatch(AppCommand::OpenScreen(Screen::Faults)).is_empty());
    }

    #[test]
    fn successful_write_requests_refetch() {
        let mut state = AppState::starting_on(Screen::Machines);

        let events = state.dispatch(AppCommand::WriteSucceeded("machine 4 deleted".to_owned()));
        assert_eq!(
            events,
            vec![
                AppEvent::NoticeShown(Notice::success("machine 4 deleted")),
                AppEvent::RefetchRequested(Screen::Machines),
            ]
        );
    }

    #[test]
    fn failure_keeps_screen_and_returns_to_nav() {
        let mut state = AppState::starting_on(Screen::Production);
        state.dispatch(AppCommand::RequestDelete);
        assert_eq!(state.mode, AppMode::ConfirmDelete);

        let events = state.dispatch(AppCommand::OperationFailed("server said no".to_owned()));
        assert_eq!(state.mode, AppMode::Nav);
        assert_eq!(state.active_screen, Screen::Production);
        assert!(!events.iter().any(|event| matches!(event, AppEvent::RefetchRequested(_))));
        assert_eq!(
            state.notice.as_ref().map(|notice| notice.kind),
            Some(NoticeKind::Failure)
        );
    }

    #[test]
    fn delete_is_refused_on_dashboard() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::RequestDelete);
        assert_eq!(state.mode, AppMode::Nav);
    }

    #[test]
    fn clear_notice_only_reports_once() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::Inform("sorted".to_owned()));

        assert_eq!(
            state.dispatch(AppCommand::ClearNotice),
            vec![AppEvent::NoticeCleared]
        );
        assert!(state.dispatch(AppCommand::ClearNotice).is_empty());
    }

    #[test]
    fn mode_transitions() {
        let mut state = AppState::default();

        state.dispatch(AppCommand::OpenSearch);
        assert_eq!(state.mode, AppMode::Search);

        state.dispatch(AppCommand::OpenHelp);
        assert_eq!(state.mode, AppMode::Help);

        state.dispatch(AppCommand::OpenForm(FormKind::Station));
        assert_eq!(state.mode, AppMode::Form(FormKind::Station));

        state.dispatch(AppCommand::ExitToNav);
        assert_eq!(state.mode, AppMode::Nav);
    }
}
