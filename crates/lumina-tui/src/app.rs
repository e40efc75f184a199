use std::path::PathBuf;

use crossterm::event::KeyCode;
use lumina_core::{FormInput, Studio};
use lumina_schema::{find_style, StudioEvent, DESIGN_STYLES};

const MAX_ACTIVITY: usize = 200;

#[derive(Debug, Clone)]
pub struct TuiOptions {
    pub default_style: String,
    /// Where `s` writes card images.
    pub save_dir: PathBuf,
}

impl Default for TuiOptions {
    fn default() -> Self {
        Self {
            default_style: lumina_schema::default_style().label.to_string(),
            save_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    BusinessName,
    Industry,
    Style,
    Card(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    EditImage,
    Refine,
}

/// One-line text entry for a card operation.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub kind: PromptKind,
    pub index: usize,
    pub buffer: String,
}

pub struct App {
    pub(crate) studio: Studio,
    pub(crate) business_name: String,
    pub(crate) industry: String,
    pub(crate) style_index: usize,
    pub(crate) focus: Focus,
    pub(crate) prompt: Option<Prompt>,
    pub(crate) activity: Vec<String>,
    pub(crate) notice: Option<String>,
    pub(crate) save_dir: PathBuf,
    pub(crate) should_quit: bool,
}

impl App {
    pub fn new(studio: Studio, options: TuiOptions) -> Self {
        let style_index = find_style(&options.default_style)
            .and_then(|style| DESIGN_STYLES.iter().position(|s| s.id == style.id))
            .unwrap_or(0);
        Self {
            studio,
            business_name: String::new(),
            industry: String::new(),
            style_index,
            focus: Focus::BusinessName,
            prompt: None,
            activity: vec![format!(
                "[{}] studio ready",
                chrono::Local::now().format("%H:%M:%S")
            )],
            notice: None,
            save_dir: options.save_dir,
            should_quit: false,
        }
    }

    pub fn studio(&self) -> &Studio {
        &self.studio
    }

    pub fn style_label(&self) -> &'static str {
        DESIGN_STYLES[self.style_index].label
    }

    pub fn form_input(&self) -> FormInput {
        FormInput::new(&self.business_name, &self.industry, self.style_label())
    }

    /// Applies finished gateway calls and clears expired copy markers.
    pub async fn pump(&mut self) {
        while let Some(completion) = self.studio.try_next_completion() {
            self.studio.apply(completion).await;
        }
        self.studio.expire_copied();
        self.clamp_focus();
    }

    pub async fn on_key(&mut self, key: KeyCode) {
        if self.prompt.is_some() {
            self.on_prompt_key(key);
            return;
        }

        match key {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => self.focus = self.next_focus(),
            KeyCode::BackTab => self.focus = self.prev_focus(),
            _ => match self.focus {
                Focus::BusinessName | Focus::Industry => self.on_text_key(key),
                Focus::Style => self.on_style_key(key),
                Focus::Card(index) => self.on_card_key(index, key).await,
            },
        }
    }

    fn on_text_key(&mut self, key: KeyCode) {
        let field = match self.focus {
            Focus::BusinessName => &mut self.business_name,
            Focus::Industry => &mut self.industry,
            _ => return,
        };
        match key {
            KeyCode::Char(c) => field.push(c),
            KeyCode::Backspace => {
                field.pop();
            }
            KeyCode::Enter => self.submit(),
            _ => {}
        }
    }

    fn on_style_key(&mut self, key: KeyCode) {
        let count = DESIGN_STYLES.len();
        match key {
            KeyCode::Left => self.style_index = (self.style_index + count - 1) % count,
            KeyCode::Right => self.style_index = (self.style_index + 1) % count,
            KeyCode::Enter => self.submit(),
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
    }

    async fn on_card_key(&mut self, index: usize, key: KeyCode) {
        match key {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Left => self.focus = Focus::Card(index.saturating_sub(1)),
            KeyCode::Right if index + 1 < self.studio.cards().len() => {
                self.focus = Focus::Card(index + 1)
            }
            KeyCode::Char('g') => {
                self.studio.generate_image(index);
            }
            KeyCode::Char('e') => {
                let has_image = self
                    .studio
                    .card(index)
                    .is_some_and(|card| card.image().is_some());
                if has_image {
                    self.open_prompt(PromptKind::EditImage, index);
                } else {
                    self.notice = Some("Generate an image first (g)".into());
                }
            }
            KeyCode::Char('r') => self.open_prompt(PromptKind::Refine, index),
            KeyCode::Char('s') => self.save_image(index),
            KeyCode::Char(c @ '1'..='9') => {
                let swatch = c as usize - '1' as usize;
                let hex = self
                    .studio
                    .concepts()
                    .get(index)
                    .and_then(|concept| concept.palette.get(swatch))
                    .map(|swatch| swatch.hex.clone());
                if let Some(hex) = hex {
                    self.studio.copy_color_hex(index, &hex).await;
                }
            }
            _ => {}
        }
    }

    fn on_prompt_key(&mut self, key: KeyCode) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };
        match key {
            KeyCode::Esc => self.prompt = None,
            KeyCode::Backspace => {
                prompt.buffer.pop();
            }
            KeyCode::Char(c) => prompt.buffer.push(c),
            KeyCode::Enter => {
                if let Some(prompt) = self.prompt.take() {
                    match prompt.kind {
                        PromptKind::EditImage => {
                            self.studio.edit_image(prompt.index, &prompt.buffer);
                        }
                        PromptKind::Refine => {
                            self.studio.refine_text(prompt.index, &prompt.buffer);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn open_prompt(&mut self, kind: PromptKind, index: usize) {
        self.notice = None;
        self.prompt = Some(Prompt {
            kind,
            index,
            buffer: String::new(),
        });
    }

    fn submit(&mut self) {
        self.notice = None;
        self.studio.submit(&self.form_input());
    }

    fn save_image(&mut self, index: usize) {
        self.notice = Some(match self.studio.save_image(index, &self.save_dir) {
            Ok(path) => format!("Saved {}", path.display()),
            Err(err) => format!("Save failed: {err}"),
        });
    }

    fn focus_order(&self) -> Vec<Focus> {
        let mut order = vec![Focus::BusinessName, Focus::Industry, Focus::Style];
        order.extend((0..self.studio.cards().len()).map(Focus::Card));
        order
    }

    fn next_focus(&self) -> Focus {
        let order = self.focus_order();
        let pos = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        order[(pos + 1) % order.len()]
    }

    fn prev_focus(&self) -> Focus {
        let order = self.focus_order();
        let pos = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        order[(pos + order.len() - 1) % order.len()]
    }

    fn clamp_focus(&mut self) {
        if let Focus::Card(index) = self.focus {
            let count = self.studio.cards().len();
            if count == 0 {
                self.focus = Focus::Style;
            } else if index >= count {
                self.focus = Focus::Card(count - 1);
            }
        }
    }

    fn push_activity(&mut self, line: String) {
        self.activity.push(line);
        if self.activity.len() > MAX_ACTIVITY {
            self.activity.remove(0);
        }
    }

    pub fn handle_studio_event(&mut self, event: StudioEvent) {
        let ts = chrono::Local::now().format("%H:%M:%S");
        let line = match event {
            StudioEvent::ConceptsGenerated {
                trace_id, count, ..
            } => format!(
                "[{ts}] ConceptsGenerated trace={} count={count}",
                &trace_id.to_string()[..8]
            ),
            StudioEvent::GenerationFailed {
                trace_id, error, ..
            } => format!(
                "[{ts}] GenerationFailed trace={} {error}",
                &trace_id.to_string()[..8]
            ),
            StudioEvent::ConceptUpdated {
                trace_id,
                index,
                concept,
                ..
            } => format!(
                "[{ts}] ConceptUpdated trace={} card={} name={}",
                &trace_id.to_string()[..8],
                index + 1,
                concept.name
            ),
            StudioEvent::ImageReady {
                trace_id,
                index,
                edited,
                ..
            } => format!(
                "[{ts}] {} trace={} card={}",
                if edited { "ImageEdited" } else { "ImageReady" },
                &trace_id.to_string()[..8],
                index + 1
            ),
            StudioEvent::CardFailed {
                trace_id,
                index,
                operation,
                error,
                ..
            } => format!(
                "[{ts}] CardFailed trace={} card={} op={operation} {error}",
                &trace_id.to_string()[..8],
                index + 1
            ),
            StudioEvent::StaleDiscarded {
                trace_id,
                index,
                operation,
                ..
            } => format!(
                "[{ts}] StaleDiscarded trace={} card={} op={operation}",
                &trace_id.to_string()[..8],
                index + 1
            ),
            StudioEvent::HexCopied { index, hex } => {
                format!("[{ts}] HexCopied card={} {hex}", index + 1)
            }
        };
        self.push_activity(line);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lumina_core::MemoryClipboard;
    use lumina_gateway::StubGateway;

    use super::*;

    fn app_with(clipboard: Arc<MemoryClipboard>) -> App {
        let studio = Studio::new(Arc::new(StubGateway), clipboard);
        App::new(studio, TuiOptions::default())
    }

    fn app() -> App {
        app_with(Arc::new(MemoryClipboard::new()))
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.on_key(KeyCode::Char(c)).await;
        }
    }

    async fn generated_app(clipboard: Arc<MemoryClipboard>) -> App {
        let mut app = app_with(clipboard);
        type_text(&mut app, "Acme").await;
        app.on_key(KeyCode::Tab).await;
        type_text(&mut app, "Coffee").await;
        app.on_key(KeyCode::Enter).await;
        app.studio.settle().await;
        app
    }

    #[tokio::test]
    async fn typing_q_in_a_field_does_not_quit() {
        let mut app = app();
        type_text(&mut app, "quartz").await;
        assert_eq!(app.business_name, "quartz");
        assert!(!app.should_quit);

        app.on_key(KeyCode::Esc).await;
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn style_picker_wraps_around() {
        let mut app = app();
        app.on_key(KeyCode::Tab).await;
        app.on_key(KeyCode::Tab).await;
        assert_eq!(app.focus, Focus::Style);
        assert_eq!(app.style_label(), "Modern & Minimalist");

        app.on_key(KeyCode::Left).await;
        assert_eq!(app.style_label(), DESIGN_STYLES[DESIGN_STYLES.len() - 1].label);
        app.on_key(KeyCode::Right).await;
        app.on_key(KeyCode::Right).await;
        assert_eq!(app.style_label(), DESIGN_STYLES[1].label);
    }

    #[tokio::test]
    async fn enter_with_empty_industry_does_nothing() {
        let mut app = app();
        type_text(&mut app, "Acme").await;
        app.on_key(KeyCode::Enter).await;
        assert_eq!(app.studio.in_flight(), 0);
    }

    #[tokio::test]
    async fn submit_fills_cards_and_extends_focus_cycle() {
        let mut app = generated_app(Arc::new(MemoryClipboard::new())).await;
        assert_eq!(app.studio.concepts().len(), 3);
        assert_eq!(app.studio.concepts()[0].name, "Acme Mark");

        app.on_key(KeyCode::Tab).await;
        app.on_key(KeyCode::Tab).await;
        assert_eq!(app.focus, Focus::Card(0));
        app.on_key(KeyCode::BackTab).await;
        assert_eq!(app.focus, Focus::Style);
    }

    #[tokio::test]
    async fn refine_prompt_dispatches_feedback() {
        let mut app = generated_app(Arc::new(MemoryClipboard::new())).await;
        app.focus = Focus::Card(1);

        app.on_key(KeyCode::Char('r')).await;
        assert!(app.prompt.is_some());
        type_text(&mut app, "rounder").await;
        app.on_key(KeyCode::Enter).await;
        assert!(app.prompt.is_none());
        app.studio.settle().await;

        assert!(app.studio.concepts()[1]
            .visual_description
            .contains("revised: rounder"));
    }

    #[tokio::test]
    async fn edit_needs_an_image() {
        let mut app = generated_app(Arc::new(MemoryClipboard::new())).await;
        app.focus = Focus::Card(0);

        app.on_key(KeyCode::Char('e')).await;
        assert!(app.prompt.is_none());
        assert!(app.notice.is_some());

        app.on_key(KeyCode::Char('g')).await;
        app.studio.settle().await;
        app.on_key(KeyCode::Char('e')).await;
        assert_eq!(app.prompt.as_ref().map(|p| p.kind), Some(PromptKind::EditImage));

        app.on_key(KeyCode::Esc).await;
        assert!(app.prompt.is_none());
        assert!(!app.should_quit);
    }

    #[tokio::test]
    async fn digit_copies_swatch_hex() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let mut app = generated_app(clipboard.clone()).await;
        app.focus = Focus::Card(2);

        app.on_key(KeyCode::Char('1')).await;
        assert_eq!(clipboard.contents().as_deref(), Some("#16A34A"));
        assert_eq!(app.studio.card(2).unwrap().copied_hex(), Some("#16A34A"));

        app.on_key(KeyCode::Char('9')).await;
        assert_eq!(clipboard.contents().as_deref(), Some("#16A34A"));
    }

    #[tokio::test]
    async fn save_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = generated_app(Arc::new(MemoryClipboard::new())).await;
        app.save_dir = dir.path().to_path_buf();
        app.focus = Focus::Card(0);

        app.on_key(KeyCode::Char('s')).await;
        assert!(app.notice.as_deref().unwrap().starts_with("Save failed"));

        app.on_key(KeyCode::Char('g')).await;
        app.pump().await;
        app.studio.settle().await;
        app.on_key(KeyCode::Char('s')).await;
        assert!(app.notice.as_deref().unwrap().contains("acme-mark-logo.png"));
        assert!(dir.path().join("acme-mark-logo.png").exists());
    }

    #[test]
    fn studio_events_show_up_in_activity() {
        let mut app = app();
        app.handle_studio_event(StudioEvent::CardFailed {
            trace_id: uuid::Uuid::new_v4(),
            generation: 1,
            index: 0,
            operation: lumina_schema::CardOperation::EditImage,
            error: "Failed to edit image.".into(),
        });

        let last = app.activity.last().unwrap();
        assert!(last.contains("CardFailed"));
        assert!(last.contains("card=1"));
        assert!(last.contains("Failed to edit image."));
    }
}
