
use winit::window::Window;
use winit_input_helper::WinitInputHelper;

use crate::framework::clock::Tick;

// Contexts
// -------------

pub struct UpdateContext<'a, Scene> {
    pub scene:  &'a mut Scene,
    pub input:  &'a WinitInputHelper,
    pub tick:   &'a Tick,
    pub window: &'a Window,
}

pub struct ResizeContext<'a, Scene> {
    pub scene:        &'a mut Scene,
    pub size:         &'a winit::dpi::PhysicalSize<u32>,
    pub scale_factor: f64,
}

/// Passed to modules once per frame after all input and updates of the frame were processed.
pub struct BeforeRenderContext<'a, Scene> {
    pub scene: &'a mut Scene,
    pub tick:  &'a Tick,
}

// Update results structs
// ----------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateResultAction {
    None, Redraw, Exit
}
impl UpdateResultAction {
    pub fn combine(self, other: Self) -> Self {
        match (self, other) {
            (UpdateResultAction::Exit, _) => UpdateResultAction::Exit,
            (_, UpdateResultAction::Exit) => UpdateResultAction::Exit,
            (UpdateResultAction::Redraw, _) => UpdateResultAction::Redraw,
            (_, UpdateResultAction::Redraw) => UpdateResultAction::Redraw,
            _ => UpdateResultAction::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputUpdateResult {
    pub handled: bool,
    pub result: UpdateResultAction
}

impl InputUpdateResult {
    pub fn combine(self, other: Self) -> Self {
        Self {
            handled: self.handled || other.handled,
            result: self.result.combine(other.result)
        }
    }
}

impl Default for InputUpdateResult {
    fn default() -> Self {
        Self {
            handled: false,
            result: UpdateResultAction::None
        }
    }
}

/// Outcome of the per-frame hook, any module can veto rendering of the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeforeRenderResult {
    pub skip_render: bool,
    pub result: UpdateResultAction,
}

impl BeforeRenderResult {
    pub fn skip(result: UpdateResultAction) -> Self {
        Self { skip_render: true, result }
    }

    pub fn combine(self, other: Self) -> Self {
        Self {
            skip_render: self.skip_render || other.skip_render,
            result: self.result.combine(other.result),
        }
    }
}

impl Default for BeforeRenderResult {
    fn default() -> Self {
        Self {
            skip_render: false,
            result: UpdateResultAction::None,
        }
    }
}

// UpdaterModule
// -------------

pub trait UpdaterModule<Scene> {
    fn input(&mut self, _context: &mut UpdateContext<Scene>) -> InputUpdateResult {
        InputUpdateResult::default()
    }

    fn update(&mut self, _context: &mut UpdateContext<Scene>) -> UpdateResultAction {
        UpdateResultAction::None
    }

    fn resize(&mut self, _context: &mut ResizeContext<Scene>) -> UpdateResultAction {
        UpdateResultAction::None
    }

    fn before_render(&mut self, _context: &mut BeforeRenderContext<Scene>) -> BeforeRenderResult {
        BeforeRenderResult::default()
    }
}

// Updater
// -------

pub struct Updater<Scene> {
    modules: Vec<Box<dyn UpdaterModule<Scene>>>,
    pub update_cnt: u64,
    pub input_cnt: u64,
}

impl<Scene> Default for Updater<Scene> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Scene> Updater<Scene> {
    pub fn new() -> Self {
        Self {
            modules: vec![],
            update_cnt: 0,
            input_cnt: 0,
        }
    }

    pub fn with_module<M>(mut self, module: M) -> Self
    where
        M: UpdaterModule<Scene> + 'static
    {
        self.modules.push(Box::new(module));
        self
    }

    /// Invoked when input has changed
    #[profiling::function]
    pub fn input(&mut self, mut context: UpdateContext<Scene>) -> UpdateResultAction {
        let mut result = InputUpdateResult::default();
        for module in self.modules.iter_mut() {
            result = result.combine(module.input(&mut context));
            if result.handled {
                break;
            }
        }
        self.input_cnt += 1;
        result.result
    }

    /// Invoked on tick
    #[profiling::function]
    pub fn update(&mut self, mut context: UpdateContext<Scene>) -> UpdateResultAction {
        let mut result = UpdateResultAction::None;
        for module in self.modules.iter_mut() {
            result = result.combine(module.update(&mut context));
        }
        self.update_cnt += 1;
        result
    }

    /// React to resize event
    #[profiling::function]
    pub fn resize(&mut self, mut context: ResizeContext<Scene>) -> UpdateResultAction {
        let mut result = UpdateResultAction::None;
        for module in self.modules.iter_mut() {
            result = result.combine(module.resize(&mut context));
        }
        result
    }

    /// Invoked on every redraw before anything is rendered, every module runs even when an earlier one skips the frame.
    #[profiling::function]
    pub fn before_render(&mut self, mut context: BeforeRenderContext<Scene>) -> BeforeRenderResult {
        let mut result = BeforeRenderResult::default();
        for module in self.modules.iter_mut() {
            result = result.combine(module.before_render(&mut context));
        }
        result
    }
}
