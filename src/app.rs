use crate::popup::{PopupController, RunOutcome, StatusClass, StatusSink};
use crate::ui::PopupView;
use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::{Stream, StreamExt};
use ratatui::{backend::Backend, backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};

/// A [`PopupView`] that redraws the terminal on every update, so the
/// "loading" state is visible while the request is in flight.
pub struct LivePopup<'a, B: Backend> {
    view: PopupView,
    terminal: &'a mut Terminal<B>,
}

impl<'a, B: Backend> LivePopup<'a, B> {
    pub fn new(terminal: &'a mut Terminal<B>) -> Self {
        Self {
            view: PopupView::new(),
            terminal,
        }
    }

    pub fn view(&self) -> &PopupView {
        &self.view
    }

    pub fn redraw(&mut self) {
        let view = &self.view;
        if let Err(e) = self.terminal.draw(|frame| view.render(frame, frame.area())) {
            tracing::warn!(error = %e, "failed to draw popup");
        }
    }
}

impl<B: Backend> StatusSink for LivePopup<'_, B> {
    fn set_status(&mut self, text: &str, class: StatusClass) {
        self.view.set_status(text, class);
        self.redraw();
    }

    fn set_preview(&mut self, text: &str) {
        self.view.set_preview(text);
        self.redraw();
    }
}

/// Open the terminal popup and run the controller once.
///
/// Returns `None` when the user closed the popup before the run finished;
/// the unfinished run is dropped along with any request in flight.
pub async fn run_popup(controller: &PopupController) -> Result<Option<RunOutcome>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        restore_terminal(None);
        return Err(e.into());
    }
    let mut terminal = match Terminal::new(CrosstermBackend::new(stdout)) {
        Ok(terminal) => terminal,
        Err(e) => {
            restore_terminal(None);
            return Err(e.into());
        }
    };

    let mut events = EventStream::new();
    let result = drive(&mut terminal, controller, &mut events).await;

    restore_terminal(Some(&mut terminal));
    result
}

/// Undo raw mode and the alternate screen. Every step runs even if an
/// earlier one failed.
fn restore_terminal(terminal: Option<&mut Terminal<CrosstermBackend<Stdout>>>) {
    if let Err(e) = disable_raw_mode() {
        tracing::error!(error = %e, "failed to disable raw mode");
    }
    let left = match terminal {
        Some(terminal) => {
            let left = execute!(terminal.backend_mut(), LeaveAlternateScreen);
            if let Err(e) = terminal.show_cursor() {
                tracing::error!(error = %e, "failed to show cursor");
            }
            left
        }
        None => execute!(io::stdout(), LeaveAlternateScreen),
    };
    if let Err(e) = left {
        tracing::error!(error = %e, "failed to leave alternate screen");
    }
}

/// Keys that close the popup.
pub fn is_close_event(event: &Event) -> bool {
    let Event::Key(key) = event else {
        return false;
    };
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Resolve once a close key arrives. If the event source ends, never resolve.
async fn wait_for_close<S>(events: &mut S) -> io::Result<()>
where
    S: Stream<Item = io::Result<Event>> + Unpin,
{
    while let Some(event) = events.next().await {
        if is_close_event(&event?) {
            return Ok(());
        }
    }
    std::future::pending().await
}

/// Run the controller while watching `events` for a close key, then keep the
/// result on screen until the popup is closed.
pub async fn drive<B, S>(
    terminal: &mut Terminal<B>,
    controller: &PopupController,
    events: &mut S,
) -> Result<Option<RunOutcome>>
where
    B: Backend,
    S: Stream<Item = io::Result<Event>> + Unpin,
{
    let mut popup = LivePopup::new(terminal);
    popup.redraw();

    let outcome = {
        let run = controller.run(&mut popup);
        tokio::pin!(run);
        tokio::select! {
            biased;
            outcome = &mut run => outcome,
            closed = wait_for_close(events) => {
                closed?;
                tracing::info!("popup closed before the run finished");
                return Ok(None);
            }
        }
    };

    // Redraw on every event so resizes are picked up
    loop {
        popup.redraw();
        let Some(event) = events.next().await else {
            break;
        };
        if is_close_event(&event?) {
            break;
        }
    }

    Ok(Some(outcome))
}
