use log::{debug, trace};

use crate::diagram::{DiagramState, DiagramSurface, RenderOutcome, RenderRequest, Theme};
use crate::error::PresenterError;
use crate::parser::{Slide, SlideDeck};
use crate::viewport::{Modifiers, Point, Viewport, ViewportConfig, ViewportInput, ViewportView};

/// Side effects the session must carry out after an input.
#[derive(Debug, Clone, PartialEq)]
pub enum PresenterEffect {
    /// Tell the other clients which slide is showing.
    Broadcast(usize),
    Render(RenderRequest),
    OpenEditor,
    /// Worth remembering for the next start.
    ThemeChanged(Theme),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PresenterInput {
    Key {
        key: String,
        /// Keys typed into a text field never navigate.
        text_input_focused: bool,
    },
    TouchStart {
        x: f64,
    },
    TouchEnd {
        x: f64,
    },
    Wheel {
        client: Point,
        delta_y: f64,
        /// Over a diagram the wheel belongs to its viewport.
        over_diagram: bool,
        mods: Modifiers,
    },
    /// Zoom and pan input for the active slide's diagram.
    Viewport(ViewportInput),
    GotoSubmit(String),
    GotoCancel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresenterConfig {
    pub swipe_threshold: f64,
    pub viewport: ViewportConfig,
    pub theme: Theme,
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self {
            swipe_threshold: 50.0,
            viewport: ViewportConfig::default(),
            theme: Theme::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlidePosition {
    Prev,
    Active,
    Next,
}

impl SlidePosition {
    pub fn class(self) -> &'static str {
        match self {
            Self::Prev => "prev",
            Self::Active => "active",
            Self::Next => "",
        }
    }
}

/// Everything the rendering layer needs to draw the presenter.
#[derive(Debug, Clone, PartialEq)]
pub struct PresenterView {
    /// 1-based for display; 0 when the deck is empty.
    pub current: usize,
    pub total: usize,
    pub progress_percent: f64,
    pub prev_enabled: bool,
    pub next_enabled: bool,
    /// `None` means the "no content yet" placeholder.
    pub active: Option<Slide>,
    pub diagram: DiagramState,
    pub diagram_svg: Option<String>,
    pub viewport: Option<ViewportView>,
    pub positions: Vec<SlidePosition>,
    pub thumbnails_visible: bool,
    pub fullscreen: bool,
    /// Prefilled value of the open goto dialog.
    pub goto_dialog: Option<String>,
    pub theme: Theme,
}

pub const EMPTY_PLACEHOLDER: &str = "No content yet";

#[derive(Debug, Clone, Default)]
struct DiagramSlot {
    state: DiagramState,
    surface: Option<DiagramSurface>,
    viewport: Option<Viewport>,
}

impl DiagramSlot {
    fn for_slide(slide: &Slide) -> Self {
        Self {
            state: if slide.has_diagram() {
                DiagramState::Unrendered
            } else {
                DiagramState::None
            },
            ..Default::default()
        }
    }
}

pub struct Presenter {
    deck: SlideDeck,
    current: usize,
    /// Bumped on every deck swap so late renders can be told apart.
    generation: u64,
    diagrams: Vec<DiagramSlot>,
    config: PresenterConfig,
    theme: Theme,
    swipe_start: Option<f64>,
    fullscreen: bool,
    thumbnails: bool,
    goto_dialog: Option<String>,
    effects: Vec<PresenterEffect>,
}

impl Presenter {
    pub fn new(deck: SlideDeck, config: PresenterConfig) -> Self {
        let diagrams = deck.iter().map(DiagramSlot::for_slide).collect();
        let mut presenter = Self {
            deck,
            current: 0,
            generation: 0,
            diagrams,
            config,
            theme: config.theme,
            swipe_start: None,
            fullscreen: false,
            thumbnails: false,
            goto_dialog: None,
            effects: Vec::new(),
        };
        presenter.activate_current();
        presenter
    }

    pub fn slide_count(&self) -> usize {
        self.deck.len()
    }

    /// 0-based index of the slide showing.
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn deck(&self) -> &SlideDeck {
        &self.deck
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn take_effects(&mut self) -> Vec<PresenterEffect> {
        std::mem::take(&mut self.effects)
    }

    pub fn navigate_forward(&mut self) -> bool {
        if self.current + 1 >= self.slide_count() {
            return false;
        }
        self.move_to(self.current + 1, true);
        true
    }

    pub fn navigate_backward(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.move_to(self.current - 1, true);
        true
    }

    /// Jump to a 1-based slide number, as typed into the goto dialog.
    pub fn go_to(&mut self, number: usize) -> Result<(), PresenterError> {
        let len = self.slide_count();
        if len == 0 {
            return Err(PresenterError::Empty);
        }
        if number < 1 || number > len {
            return Err(PresenterError::OutOfRange {
                requested: number,
                len,
            });
        }
        self.jump_to_slide(number - 1);
        Ok(())
    }

    pub fn first(&mut self) -> bool {
        self.jump_to_slide(0)
    }

    pub fn last(&mut self) -> bool {
        self.jump_to_slide(self.slide_count().saturating_sub(1))
    }

    /// Local jump to a 0-based index. Broadcasts; a jump to the slide already
    /// showing does nothing.
    pub fn jump_to_slide(&mut self, index: usize) -> bool {
        if index >= self.slide_count() || index == self.current {
            return false;
        }
        self.move_to(index, true);
        true
    }

    /// Position change coming from another client. Never re-broadcast.
    pub fn apply_remote_page(&mut self, page: usize) -> bool {
        if page >= self.slide_count() {
            debug!("Ignoring remote page {page}, deck has {}", self.slide_count());
            return false;
        }
        if page != self.current {
            self.move_to(page, false);
        }
        true
    }

    fn move_to(&mut self, index: usize, broadcast: bool) {
        self.current = index;
        if broadcast {
            self.effects.push(PresenterEffect::Broadcast(index));
        }
        self.activate_current();
    }

    /// Swap in a new deck. Viewports and render states of the old deck are
    /// dropped; only the active slide's diagram is requested.
    pub fn replace_deck(&mut self, deck: SlideDeck) {
        self.generation += 1;
        self.diagrams = deck.iter().map(DiagramSlot::for_slide).collect();
        self.deck = deck;
        self.current = self.current.min(self.slide_count().saturating_sub(1));
        self.effects
            .retain(|e| !matches!(e, PresenterEffect::Render(_)));
        self.activate_current();
    }

    fn activate_current(&mut self) {
        let index = self.current;
        let Some(slot) = self.diagrams.get_mut(index) else {
            return;
        };
        if slot.state != DiagramState::Unrendered {
            return;
        }
        let Some(source) = self.deck[index].diagram.clone() else {
            return;
        };
        slot.state = DiagramState::Rendering;
        self.effects.push(PresenterEffect::Render(RenderRequest {
            slide: index,
            generation: self.generation,
            source,
            theme: self.theme,
        }));
    }

    /// Apply a finished render. Returns false for stale results.
    pub fn complete_render(&mut self, outcome: RenderOutcome) -> bool {
        if outcome.generation != self.generation {
            trace!(
                "Dropping stale render for slide {} (generation {} != {})",
                outcome.slide, outcome.generation, self.generation
            );
            return false;
        }
        let viewport_config = self.config.viewport;
        let Some(slot) = self.diagrams.get_mut(outcome.slide) else {
            return false;
        };
        match outcome.result {
            Ok(surface) => {
                slot.viewport = Some(Viewport::new(&surface, viewport_config));
                slot.surface = Some(surface);
                slot.state = DiagramState::Ready;
            }
            Err(e) => {
                debug!("Diagram on slide {} failed: {e}", outcome.slide);
                slot.state = DiagramState::Failed(e.to_string());
                slot.surface = None;
                slot.viewport = None;
            }
        }
        true
    }

    /// Forget every render and viewport. Renders still running become stale.
    pub fn release_diagrams(&mut self) {
        self.generation += 1;
        self.diagrams = self.deck.iter().map(DiagramSlot::for_slide).collect();
        self.effects
            .retain(|e| !matches!(e, PresenterEffect::Render(_)));
    }

    /// Renders in flight were lost with the connection. Their slots go back
    /// to unrendered and the active one is requested again.
    pub fn abandon_renders(&mut self) {
        let mut abandoned = 0;
        for slot in &mut self.diagrams {
            if slot.state == DiagramState::Rendering {
                slot.state = DiagramState::Unrendered;
                abandoned += 1;
            }
        }
        if abandoned == 0 {
            return;
        }
        debug!("Abandoned {abandoned} diagram render(s)");
        self.generation += 1;
        self.effects
            .retain(|e| !matches!(e, PresenterEffect::Render(_)));
        self.activate_current();
    }

    /// Flip between light and dark. Every diagram is drawn again in the new
    /// theme, starting with the active one.
    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        debug!("Theme switched to {}", self.theme);
        self.effects.push(PresenterEffect::ThemeChanged(self.theme));
        self.release_diagrams();
        self.activate_current();
    }

    pub fn diagram_state(&self, index: usize) -> Option<&DiagramState> {
        self.diagrams.get(index).map(|s| &s.state)
    }

    /// Viewport of the active slide's diagram, once it has rendered.
    pub fn viewport_mut(&mut self) -> Option<&mut Viewport> {
        self.diagrams
            .get_mut(self.current)
            .and_then(|s| s.viewport.as_mut())
    }

    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen = !self.fullscreen;
    }

    pub fn toggle_thumbnails(&mut self) {
        self.thumbnails = !self.thumbnails;
    }

    pub fn open_goto_dialog(&mut self) {
        self.goto_dialog = Some((self.current + 1).to_string());
    }

    pub fn close_goto_dialog(&mut self) {
        self.goto_dialog = None;
    }

    /// Submit the goto dialog. On error the dialog stays open.
    pub fn submit_goto(&mut self, text: &str) -> Result<(), PresenterError> {
        let number = text.trim().parse::<usize>().unwrap_or(0);
        self.go_to(number).inspect_err(|_| {
            self.goto_dialog = Some(text.to_string());
        })?;
        self.goto_dialog = None;
        Ok(())
    }

    pub fn handle(&mut self, input: PresenterInput) -> Result<(), PresenterError> {
        match input {
            PresenterInput::Key {
                key,
                text_input_focused,
            } => {
                if !text_input_focused {
                    self.handle_key(&key);
                }
            }
            PresenterInput::TouchStart { x } => self.swipe_start = Some(x),
            PresenterInput::TouchEnd { x } => {
                if let Some(start) = self.swipe_start.take() {
                    let diff = start - x;
                    if diff.abs() > self.config.swipe_threshold {
                        if diff > 0.0 {
                            self.navigate_forward();
                        } else {
                            self.navigate_backward();
                        }
                    }
                }
            }
            PresenterInput::Wheel {
                client,
                delta_y,
                over_diagram,
                mods,
            } => {
                if over_diagram {
                    if let Some(viewport) = self.viewport_mut() {
                        viewport.wheel(client, delta_y, mods);
                    }
                } else if !mods.ctrl && !mods.meta {
                    if delta_y > 0.0 {
                        self.navigate_forward();
                    } else if delta_y < 0.0 {
                        self.navigate_backward();
                    }
                }
            }
            PresenterInput::Viewport(input) => match self.viewport_mut() {
                Some(viewport) => {
                    viewport.handle(input);
                }
                None => trace!("No diagram viewport on slide {}", self.current),
            },
            PresenterInput::GotoSubmit(text) => return self.submit_goto(&text),
            PresenterInput::GotoCancel => self.close_goto_dialog(),
        }
        Ok(())
    }

    fn handle_key(&mut self, key: &str) {
        match key {
            "ArrowRight" | " " | "Enter" => {
                self.navigate_forward();
            }
            "ArrowLeft" => {
                self.navigate_backward();
            }
            "f" | "F" => self.toggle_fullscreen(),
            "e" | "E" => self.effects.push(PresenterEffect::OpenEditor),
            "g" | "G" => self.open_goto_dialog(),
            "t" | "T" => self.toggle_thumbnails(),
            "d" | "D" => self.toggle_theme(),
            "Escape" => {
                self.fullscreen = false;
                self.close_goto_dialog();
            }
            "Home" => {
                self.first();
            }
            "End" => {
                self.last();
            }
            digit => {
                if let Some(n) = single_digit(digit) {
                    self.jump_to_slide(n - 1);
                }
            }
        }
    }

    pub fn view(&self) -> PresenterView {
        let total = self.slide_count();
        let slot = self.diagrams.get(self.current);
        PresenterView {
            current: if total == 0 { 0 } else { self.current + 1 },
            total,
            progress_percent: if total == 0 {
                0.0
            } else {
                (self.current + 1) as f64 / total as f64 * 100.0
            },
            prev_enabled: self.current > 0,
            next_enabled: self.current + 1 < total,
            active: self.deck.get(self.current).cloned(),
            diagram: slot.map(|s| s.state.clone()).unwrap_or_default(),
            diagram_svg: slot.and_then(|s| s.surface.as_ref()).map(|s| s.svg.clone()),
            viewport: slot.and_then(|s| s.viewport.as_ref()).map(Viewport::view),
            positions: (0..total)
                .map(|i| match i.cmp(&self.current) {
                    std::cmp::Ordering::Less => SlidePosition::Prev,
                    std::cmp::Ordering::Equal => SlidePosition::Active,
                    std::cmp::Ordering::Greater => SlidePosition::Next,
                })
                .collect(),
            thumbnails_visible: self.thumbnails,
            fullscreen: self.fullscreen,
            goto_dialog: self.goto_dialog.clone(),
            theme: self.theme,
        }
    }
}

fn single_digit(key: &str) -> Option<usize> {
    let mut chars = key.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    match c.to_digit(10)? {
        0 => None,
        d => Some(d as usize),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::OutlineRenderer;
    use crate::error::RenderError;
    use crate::parser::segment_deck;

    fn deck(n: usize) -> SlideDeck {
        let md: Vec<String> = (1..=n).map(|i| format!("# Slide {i}")).collect();
        segment_deck(&md.join("\n\n---\n\n"))
    }

    fn key(k: &str) -> PresenterInput {
        PresenterInput::Key {
            key: k.to_string(),
            text_input_focused: false,
        }
    }

    fn broadcasts(p: &mut Presenter) -> Vec<usize> {
        p.take_effects()
            .into_iter()
            .filter_map(|e| match e {
                PresenterEffect::Broadcast(i) => Some(i),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_next_and_previous_broadcast() {
        let mut p = Presenter::new(deck(3), PresenterConfig::default());
        assert!(p.navigate_forward());
        assert!(p.navigate_forward());
        assert!(!p.navigate_forward(), "clamped at the last slide");
        assert_eq!(p.current(), 2);
        assert_eq!(broadcasts(&mut p), vec![1, 2]);

        assert!(p.navigate_backward());
        assert_eq!(broadcasts(&mut p), vec![1]);
    }

    #[test]
    fn test_previous_at_first_slide_is_silent() {
        let mut p = Presenter::new(deck(3), PresenterConfig::default());
        assert!(!p.navigate_backward());
        assert_eq!(p.current(), 0);
        assert!(broadcasts(&mut p).is_empty());
    }

    #[test]
    fn test_go_to_validates_range() {
        let mut p = Presenter::new(deck(3), PresenterConfig::default());
        let err = p.go_to(4).unwrap_err();
        assert_eq!(err.to_string(), "Please enter a number between 1 and 3");
        assert_eq!(p.go_to(0), Err(PresenterError::OutOfRange { requested: 0, len: 3 }));
        assert_eq!(p.current(), 0);

        p.go_to(3).unwrap();
        assert_eq!(p.current(), 2);
        assert_eq!(broadcasts(&mut p), vec![2]);

        let mut empty = Presenter::new(SlideDeck::empty(), PresenterConfig::default());
        assert_eq!(empty.go_to(1), Err(PresenterError::Empty));
    }

    #[test]
    fn test_remote_page_not_rebroadcast() {
        let mut p = Presenter::new(deck(3), PresenterConfig::default());
        assert!(p.apply_remote_page(2));
        assert_eq!(p.current(), 2);
        assert!(broadcasts(&mut p).is_empty());
        assert!(!p.apply_remote_page(7));
        assert_eq!(p.current(), 2);
    }

    #[test]
    fn test_key_mapping() {
        let mut p = Presenter::new(deck(5), PresenterConfig::default());
        p.handle(key("ArrowRight")).unwrap();
        p.handle(key(" ")).unwrap();
        p.handle(key("Enter")).unwrap();
        assert_eq!(p.current(), 3);
        p.handle(key("ArrowLeft")).unwrap();
        assert_eq!(p.current(), 2);
        p.handle(key("Home")).unwrap();
        assert_eq!(p.current(), 0);
        p.handle(key("End")).unwrap();
        assert_eq!(p.current(), 4);
        p.handle(key("2")).unwrap();
        assert_eq!(p.current(), 1);
        p.handle(key("9")).unwrap();
        assert_eq!(p.current(), 1, "digit beyond deck ignored");
        p.handle(key("0")).unwrap();
        assert_eq!(p.current(), 1);

        p.handle(PresenterInput::Key {
            key: "ArrowRight".to_string(),
            text_input_focused: true,
        })
        .unwrap();
        assert_eq!(p.current(), 1, "typing in a field does not navigate");
    }

    #[test]
    fn test_home_on_first_slide_is_noop() {
        let mut p = Presenter::new(deck(3), PresenterConfig::default());
        assert!(!p.first());
        assert!(broadcasts(&mut p).is_empty());
    }

    #[test]
    fn test_toggles_and_dialog() {
        let mut p = Presenter::new(deck(3), PresenterConfig::default());
        p.handle(key("f")).unwrap();
        p.handle(key("t")).unwrap();
        p.navigate_forward();
        p.handle(key("g")).unwrap();
        let view = p.view();
        assert!(view.fullscreen);
        assert!(view.thumbnails_visible);
        assert_eq!(view.goto_dialog.as_deref(), Some("2"));

        p.handle(key("Escape")).unwrap();
        let view = p.view();
        assert!(!view.fullscreen);
        assert_eq!(view.goto_dialog, None);

        p.handle(key("e")).unwrap();
        assert!(p.take_effects().contains(&PresenterEffect::OpenEditor));
    }

    #[test]
    fn test_goto_submit() {
        let mut p = Presenter::new(deck(3), PresenterConfig::default());
        p.open_goto_dialog();
        assert!(p.handle(PresenterInput::GotoSubmit("abc".to_string())).is_err());
        assert_eq!(p.view().goto_dialog.as_deref(), Some("abc"));
        p.handle(PresenterInput::GotoSubmit(" 3 ".to_string())).unwrap();
        assert_eq!(p.current(), 2);
        assert_eq!(p.view().goto_dialog, None);
    }

    #[test]
    fn test_swipe() {
        let mut p = Presenter::new(deck(3), PresenterConfig::default());
        p.handle(PresenterInput::TouchStart { x: 300.0 }).unwrap();
        p.handle(PresenterInput::TouchEnd { x: 200.0 }).unwrap();
        assert_eq!(p.current(), 1, "swipe left goes forward");

        p.handle(PresenterInput::TouchStart { x: 200.0 }).unwrap();
        p.handle(PresenterInput::TouchEnd { x: 230.0 }).unwrap();
        assert_eq!(p.current(), 1, "short swipe ignored");

        p.handle(PresenterInput::TouchStart { x: 100.0 }).unwrap();
        p.handle(PresenterInput::TouchEnd { x: 200.0 }).unwrap();
        assert_eq!(p.current(), 0);
    }

    #[test]
    fn test_wheel() {
        let mut p = Presenter::new(deck(3), PresenterConfig::default());
        let wheel = |delta_y, over_diagram, ctrl| PresenterInput::Wheel {
            client: Point::new(0.0, 0.0),
            delta_y,
            over_diagram,
            mods: Modifiers {
                ctrl,
                ..Default::default()
            },
        };
        p.handle(wheel(10.0, false, false)).unwrap();
        assert_eq!(p.current(), 1);
        p.handle(wheel(10.0, true, false)).unwrap();
        p.handle(wheel(10.0, false, true)).unwrap();
        assert_eq!(p.current(), 1);
        p.handle(wheel(-10.0, false, false)).unwrap();
        assert_eq!(p.current(), 0);
    }

    #[test]
    fn test_view_progress_and_positions() {
        let mut p = Presenter::new(deck(4), PresenterConfig::default());
        p.navigate_forward();
        let view = p.view();
        assert_eq!(view.current, 2);
        assert_eq!(view.total, 4);
        assert_eq!(view.progress_percent, 50.0);
        assert!(view.prev_enabled && view.next_enabled);
        assert_eq!(
            view.positions,
            vec![
                SlidePosition::Prev,
                SlidePosition::Active,
                SlidePosition::Next,
                SlidePosition::Next
            ]
        );
    }

    #[test]
    fn test_empty_deck_placeholder() {
        let p = Presenter::new(SlideDeck::empty(), PresenterConfig::default());
        let view = p.view();
        assert_eq!(view.current, 0);
        assert_eq!(view.total, 0);
        assert!(view.active.is_none());
        assert!(!view.prev_enabled && !view.next_enabled);
    }

    #[test]
    fn test_replace_deck_clamps_and_bumps_generation() {
        let mut p = Presenter::new(deck(5), PresenterConfig::default());
        p.last();
        p.replace_deck(deck(2));
        assert_eq!(p.current(), 1);
        assert_eq!(p.generation(), 1);
        p.replace_deck(SlideDeck::empty());
        assert_eq!(p.current(), 0);
        assert!(p.view().active.is_none());
    }

    fn diagram_deck() -> SlideDeck {
        segment_deck("# One\n\n```mermaid\ngraph TD\n  A --> B\n```\n\n---\n\n# Two\n\n```mermaid\npie\n```")
    }

    fn render_requests(p: &mut Presenter) -> Vec<RenderRequest> {
        p.take_effects()
            .into_iter()
            .filter_map(|e| match e {
                PresenterEffect::Render(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_lazy_render_only_active_slide() {
        let mut p = Presenter::new(diagram_deck(), PresenterConfig::default());
        let requests = render_requests(&mut p);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].slide, 0);
        assert_eq!(p.diagram_state(1), Some(&DiagramState::Unrendered));

        p.navigate_forward();
        let requests = render_requests(&mut p);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].slide, 1);

        // Going back does not re-request an in-progress render
        p.navigate_backward();
        assert!(render_requests(&mut p).is_empty());
    }

    #[test]
    fn test_render_success_creates_viewport() {
        let mut p = Presenter::new(diagram_deck(), PresenterConfig::default());
        let request = render_requests(&mut p).remove(0);
        let outcome = RenderOutcome {
            slide: request.slide,
            generation: request.generation,
            result: OutlineRenderer::render_sync(&request.source, request.theme),
        };
        assert!(p.complete_render(outcome));
        assert_eq!(p.diagram_state(0), Some(&DiagramState::Ready));
        assert!(p.viewport_mut().is_some_and(|vp| vp.zoom_in()));
        let view = p.view();
        assert_eq!(view.viewport.map(|v| v.percent), Some(120));
        assert!(view.diagram_svg.is_some());
    }

    #[test]
    fn test_stale_render_ignored() {
        let mut p = Presenter::new(diagram_deck(), PresenterConfig::default());
        let request = render_requests(&mut p).remove(0);
        p.replace_deck(diagram_deck());
        let stale = RenderOutcome {
            slide: request.slide,
            generation: request.generation,
            result: OutlineRenderer::render_sync(&request.source, request.theme),
        };
        assert!(!p.complete_render(stale));
        assert_eq!(p.diagram_state(0), Some(&DiagramState::Rendering));
        assert_eq!(render_requests(&mut p)[0].generation, 1);
    }

    #[test]
    fn test_render_failure_is_local_to_slide() {
        let mut p = Presenter::new(diagram_deck(), PresenterConfig::default());
        let request = render_requests(&mut p).remove(0);
        p.complete_render(RenderOutcome {
            slide: request.slide,
            generation: request.generation,
            result: Err(RenderError::Syntax("bad arrow".to_string())),
        });
        assert_eq!(
            p.view().diagram,
            DiagramState::Failed("diagram syntax error: bad arrow".to_string())
        );
        assert!(p.viewport_mut().is_none());
        p.navigate_forward();
        assert_eq!(p.diagram_state(1), Some(&DiagramState::Rendering));
    }

    fn render_active(p: &mut Presenter) -> RenderRequest {
        let request = render_requests(p).remove(0);
        p.complete_render(RenderOutcome {
            slide: request.slide,
            generation: request.generation,
            result: OutlineRenderer::render_sync(&request.source, request.theme),
        });
        request
    }

    fn zoom_modifier() -> Modifiers {
        Modifiers {
            ctrl: true,
            meta: true,
            shift: false,
        }
    }

    #[test]
    fn test_wheel_over_diagram_zooms_instead_of_navigating() {
        let mut p = Presenter::new(diagram_deck(), PresenterConfig::default());
        render_active(&mut p);
        p.handle(PresenterInput::Wheel {
            client: Point::new(10.0, 10.0),
            delta_y: -3.0,
            over_diagram: true,
            mods: zoom_modifier(),
        })
        .unwrap();
        assert_eq!(p.current(), 0);
        assert_eq!(p.view().viewport.map(|v| v.percent), Some(120));

        p.handle(PresenterInput::Wheel {
            client: Point::new(10.0, 10.0),
            delta_y: 3.0,
            over_diagram: true,
            mods: Modifiers::default(),
        })
        .unwrap();
        assert_eq!(p.current(), 0, "plain wheel over a diagram does not navigate");
        assert_eq!(p.view().viewport.map(|v| v.percent), Some(120));
    }

    #[test]
    fn test_viewport_input_reaches_active_diagram() {
        let mut p = Presenter::new(diagram_deck(), PresenterConfig::default());
        p.handle(PresenterInput::Viewport(ViewportInput::ZoomIn)).unwrap();
        assert!(p.view().viewport.is_none(), "nothing to zoom before the render");

        render_active(&mut p);
        p.handle(PresenterInput::Viewport(ViewportInput::ZoomIn)).unwrap();
        p.handle(PresenterInput::Viewport(ViewportInput::ZoomIn)).unwrap();
        assert_eq!(p.view().viewport.map(|v| v.percent), Some(144));
        p.handle(PresenterInput::Viewport(ViewportInput::DoubleClick))
            .unwrap();
        assert_eq!(p.view().viewport.map(|v| v.percent), Some(100));
    }

    #[test]
    fn test_theme_toggle_rerenders_in_new_theme() {
        let mut p = Presenter::new(diagram_deck(), PresenterConfig::default());
        let first = render_active(&mut p);
        assert_eq!(first.theme, Theme::Light);
        assert_eq!(p.diagram_state(0), Some(&DiagramState::Ready));

        p.handle(key("d")).unwrap();
        assert_eq!(p.theme(), Theme::Dark);
        assert_eq!(p.view().theme, Theme::Dark);
        let effects = p.take_effects();
        assert!(effects.contains(&PresenterEffect::ThemeChanged(Theme::Dark)));
        let requests: Vec<&RenderRequest> = effects
            .iter()
            .filter_map(|e| match e {
                PresenterEffect::Render(r) => Some(r),
                _ => None,
            })
            .collect();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].slide, 0);
        assert_eq!(requests[0].theme, Theme::Dark);
        assert!(requests[0].generation > first.generation);
        assert_eq!(p.diagram_state(0), Some(&DiagramState::Rendering));
        assert_eq!(p.diagram_state(1), Some(&DiagramState::Unrendered));
    }

    #[test]
    fn test_initial_theme_from_config() {
        let config = PresenterConfig {
            theme: Theme::Dark,
            ..Default::default()
        };
        let mut p = Presenter::new(diagram_deck(), config);
        assert_eq!(render_requests(&mut p)[0].theme, Theme::Dark);
    }

    #[test]
    fn test_abandoned_render_is_requested_again() {
        let mut p = Presenter::new(diagram_deck(), PresenterConfig::default());
        let lost = render_requests(&mut p).remove(0);
        p.navigate_forward();
        assert_eq!(render_requests(&mut p).len(), 1);

        p.abandon_renders();
        assert_eq!(p.diagram_state(0), Some(&DiagramState::Unrendered));
        let again = render_requests(&mut p);
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].slide, 1);

        p.navigate_backward();
        let back = render_requests(&mut p);
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].slide, 0);
        assert!(back[0].generation > lost.generation);
    }
}
