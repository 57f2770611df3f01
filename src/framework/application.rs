use std::sync::Arc;

use winit_input_helper::WinitInputHelper;
use winit::{
    event::Event,
    platform::run_return::EventLoopExtRunReturn,
    window::{Window, WindowBuilder},
    event_loop::{EventLoop, ControlFlow},
};

use crate::{error, info};

use super::{
    gpu,
    renderer::Renderer,
    clock::Clock,
    camera::SceneWithCamera,
    updater::{
        Updater,
        ResizeContext,
        UpdateContext,
        BeforeRenderContext,
        UpdateResultAction,
    },
};

#[derive(Clone, Debug)]
pub struct RunParams {
    pub window_name: &'static str,
    pub window_width: u32,
    pub window_height: u32,
    pub tick_per_second: u32,
}
impl Default for RunParams {
    fn default() -> Self {
        Self {
            window_name: "My App",
            window_width: 1280,
            window_height: 720,
            tick_per_second: 30
        }
    }
}

pub struct Context<'a> {
    pub params: &'a RunParams,
    pub window: &'a Window,
    pub gpu: Arc<gpu::Context>,
}

pub struct ApplicationDescriptor<A, B, C> {
    pub init_renderer: A,
    pub init_updater: B,
    pub init_scene: C,
}

/// Runs the window event loop until the window is closed or a module requests exit.
///
/// Every redraw first lets updater modules synchronize the scene (`before_render`), only then the scene is
/// rendered, unless any module asked to skip the frame.
#[profiling::function]
pub async fn run<S, DR, DU, IS>(app_desc: ApplicationDescriptor<DR, DU, IS>, params: RunParams) -> anyhow::Result<()>
where
    S:  SceneWithCamera + Sized,
    DR: FnOnce(&Context) -> anyhow::Result<Renderer<S>>, // init_renderer
    DU: FnOnce(&Context) -> Updater<S>,                  // init_updater
    IS: FnOnce(&Context) -> anyhow::Result<S>,           // init_scene
{
    let mut event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title(params.window_name)
        .with_inner_size(winit::dpi::LogicalSize::new(params.window_width, params.window_height))
        .build(&event_loop)?;
    let gpu = Arc::new(gpu::Context::new(&window).await?);
    info!("Running on {:?}", gpu.adapter.get_info());

    let context = Context {
        params: &params,
        window: &window,
        gpu:    gpu.clone(),
    };

    // init application specifics
    let mut scene = (app_desc.init_scene)(&context)?;
    let mut updater = (app_desc.init_updater)(&context);
    let mut renderer = (app_desc.init_renderer)(&context)?;

    // Execution control
    let mut input = WinitInputHelper::new();
    let mut clock = Clock::now(params.tick_per_second);
    let mut fatal_error: Option<anyhow::Error> = None;

    // Aspect ratio of the initial window
    let size = window.inner_size();
    updater.resize(ResizeContext {
        scene: &mut scene,
        size: &size,
        scale_factor: window.scale_factor(),
    });

    event_loop.run_return(|event, _, control_flow| {
        profiling::scope!("Event incoming");

        let mut flow_result_action = UpdateResultAction::None;

        match event {
            // Render frame when windows requests a redraw not on every update
            Event::RedrawRequested(_) => {
                profiling::scope!("Processing redraw request");

                let frame = updater.before_render(BeforeRenderContext {
                    scene: &mut scene,
                    tick:  clock.current_tick(),
                });
                flow_result_action = flow_result_action.combine(frame.result);

                if !frame.skip_render && frame.result != UpdateResultAction::Exit {
                    renderer.prepare(&scene);
                    if let Err(render_error) = renderer.render() {
                        error!("Rendering failed: {:#}", render_error);
                        fatal_error = Some(render_error);
                        flow_result_action = UpdateResultAction::Exit;
                    }
                }

                // Request redraw immediately after frame is rendered, to let it run as fast as possible and let vSync to limit FPS by blocking
                flow_result_action = flow_result_action.combine(UpdateResultAction::Redraw);
                profiling::finish_frame!();
            },

            // input.update(..) returns true only on Event::MainEventsCleared, after that input state of the whole step is known
            _ => if input.update(&event) {
                profiling::scope!("Processing input");

                let input_result = if let Some(size) = input.window_resized() {
                    let scale_factor = input.scale_factor().unwrap_or(window.scale_factor());
                    renderer.resize(&size, scale_factor);
                    updater.resize(ResizeContext {
                        scene: &mut scene,
                        size:  &size,
                        scale_factor,
                    })
                } else if let Some(scale_factor) = input.scale_factor_changed() {
                    let size = window.inner_size();
                    renderer.resize(&size, scale_factor);
                    updater.resize(ResizeContext {
                        scene: &mut scene,
                        size:  &size,
                        scale_factor,
                    })
                } else if input.close_requested() || input.destroyed() {
                    UpdateResultAction::Exit
                } else {
                    updater.input(UpdateContext {
                        scene:  &mut scene,
                        input:  &input,
                        tick:   clock.current_tick(),
                        window: &window,
                    })
                };
                flow_result_action = flow_result_action.combine(input_result);
            },
        }

        // Update application only when is its time to do so
        if clock.tick() {
            let update_result = updater.update(UpdateContext {
                scene:  &mut scene,
                input:  &input,
                tick:   clock.current_tick(),
                window: &window,
            });
            flow_result_action = flow_result_action.combine(update_result);
        } else {
            // Schedule next tick as a time to wake up in case of idling
            *control_flow = ControlFlow::WaitUntil(clock.next_scheduled_tick());
        }

        // Decide on final control flow based on combination of all result actions
        match flow_result_action {
            UpdateResultAction::Exit => *control_flow = ControlFlow::Exit,
            UpdateResultAction::Redraw => window.request_redraw(),
            UpdateResultAction::None => {},
        }
    });

    info!("Application exited after {} updates", updater.update_cnt);
    match fatal_error {
        Some(fatal_error) => Err(fatal_error),
        None => Ok(()),
    }
}
