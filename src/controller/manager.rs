use std::time::{Duration, Instant};

use glam::Vec2;

use crate::config::Config;
use crate::controller::camera_controller::CameraController;
use crate::controller::frame_loop::FrameClock;
use crate::controller::input::{InputEvent, InputState};
use crate::error::InitError;
use crate::model::{Camera, Scene};
use crate::view::{Graphics, Platform};

/// How long `late` blocks on window events while there is nothing to draw into.
pub const MINIMISED_POLL: Duration = Duration::from_millis(50);

/// Where the program is in its lifecycle. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProgramState {
    Starting,
    Running,
    Closing,
}

impl ProgramState {
    /// `next` if it lies ahead of `self`, otherwise `self` unchanged.
    pub fn advance(self, next: ProgramState) -> ProgramState {
        self.max(next)
    }
}

/// Drives one frame as early → input → logic → draw → late, bracketed by
/// `init` and `quit`. Owns the window, the GPU and everything drawn with them.
pub struct Manager<P: Platform, G: Graphics> {
    state: ProgramState,
    config: Config,
    platform: P,
    graphics: G,
    input: InputState,
    camera: Camera,
    controller: CameraController,
    clock: FrameClock,
    viewport: (u32, u32),
    minimised: bool,
    program: Option<G::Program>,
    scene: Option<Scene<G::Buffers>>,
}

impl<P: Platform, G: Graphics> Manager<P, G> {
    pub fn new(config: Config, platform: P, graphics: G) -> Self {
        let viewport = platform.viewport_size();
        let mut camera = Camera::new(viewport.0, viewport.1);
        camera.fov_y = config.camera.fov_y;
        camera.eye = config.camera.start();
        camera.set_look_at(config.camera.look_at());
        let controller = CameraController::new(&config.camera);

        Self {
            state: ProgramState::Starting,
            config,
            platform,
            graphics,
            input: InputState::new(),
            camera,
            controller,
            clock: FrameClock::new(Instant::now()),
            viewport,
            minimised: false,
            program: None,
            scene: None,
        }
    }

    pub fn state(&self) -> ProgramState {
        self.state
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn graphics(&self) -> &G {
        &self.graphics
    }

    pub fn scene(&self) -> Option<&Scene<G::Buffers>> {
        self.scene.as_ref()
    }

    fn set_state(&mut self, next: ProgramState) {
        let advanced = self.state.advance(next);
        if advanced != self.state {
            tracing::debug!("state {:?} -> {:?}", self.state, advanced);
            self.state = advanced;
        }
    }

    /// Setup all of the program. Errors leave the state at Starting.
    pub fn init(&mut self) -> Result<(), InitError> {
        if self.state != ProgramState::Starting {
            tracing::warn!("init called while {:?}, ignoring", self.state);
            return Ok(());
        }

        let assets = &self.config.assets;
        let program = self.graphics.create_program(&assets.vertex_shader, &assets.fragment_shader)?;
        let graphics = &mut self.graphics;
        let scene = Scene::build(&self.config.level, |mesh| graphics.create_buffers(mesh));
        self.program = Some(program);
        self.scene = Some(scene);

        self.platform.capture_cursor();
        let focused = self.platform.has_focus();
        self.input.process_event(&InputEvent::FocusChanged { focused });
        self.viewport = self.platform.viewport_size();
        self.camera.set_aspect(self.viewport.0, self.viewport.1);
        self.clock = FrameClock::new(Instant::now());

        self.set_state(ProgramState::Running);
        tracing::info!("Started program...");
        Ok(())
    }

    /// Start of update
    pub fn early(&mut self) {
        self.clock.tick(Instant::now());
    }

    /// Mouse look and movement from the state gathered during the last poll.
    pub fn input(&mut self) {
        if self.input.key(self.controller.bindings.quit).released {
            tracing::info!("quit key released");
            self.quit();
            return;
        }

        if self.input.focused() {
            let center = Vec2::new(self.viewport.0 as f32, self.viewport.1 as f32) * 0.5;
            if let Some(cursor) = self.input.cursor() {
                self.controller.apply_look(&mut self.camera, cursor - center);
            }
            self.platform.warp_cursor(center);
            self.input.set_cursor(center);
        }

        self.controller.update_movement(&mut self.camera, &self.input, self.clock.delta());
    }

    /// Main game logic
    pub fn logic(&mut self) {
        if let Some(fps) = self.clock.take_fps_sample() {
            let title = format!("{} | {:.0} FPS", self.config.window.title, fps);
            self.platform.set_title(&title);
        }
    }

    /// Draw the game
    pub fn draw(&mut self) {
        if self.minimised {
            return;
        }
        let (Some(program), Some(scene)) = (&self.program, &self.scene) else {
            return;
        };
        self.graphics.bind_shader_data(self.camera.view_proj(), &scene.objects);
        self.graphics.draw(program, &scene.objects, self.viewport);
    }

    /// Present, roll input over and collect the next batch of events.
    pub fn late(&mut self) {
        if !self.minimised {
            self.graphics.present();
        }
        self.input.end_frame();
        let timeout = if self.minimised { MINIMISED_POLL } else { Duration::ZERO };
        self.platform.poll_events(&mut self.input, timeout);

        let viewport = self.platform.viewport_size();
        let minimised = viewport.0 == 0 || viewport.1 == 0;
        if minimised != self.minimised {
            tracing::debug!("window {}", if minimised { "minimised" } else { "restored" });
            self.minimised = minimised;
        }
        if !minimised && viewport != self.viewport {
            self.viewport = viewport;
            self.graphics.resize(viewport.0, viewport.1);
            self.camera.set_aspect(viewport.0, viewport.1);
        }

        if self.platform.should_close() {
            self.set_state(ProgramState::Closing);
        }
    }

    /// Close and clean up. Safe to call more than once.
    pub fn quit(&mut self) {
        if let Some(scene) = self.scene.take() {
            let graphics = &mut self.graphics;
            scene.release(|buffers| graphics.destroy_buffers(buffers));
            self.program = None;
            self.platform.close();
            tracing::info!("released scene and closed window");
        }
        self.set_state(ProgramState::Closing);
    }

    /// One pass of the frame loop. Stops early if `input` asked to quit.
    pub fn frame(&mut self) {
        self.early();
        self.input();
        if self.state != ProgramState::Running {
            return;
        }
        self.logic();
        self.draw();
        self.late();
    }

    pub fn run(&mut self) -> Result<(), InitError> {
        self.init()?;
        while self.state == ProgramState::Running {
            self.frame();
        }
        self.quit();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GameObject, PITCH_LIMIT};
    use crate::utils::Mesh;
    use glam::Mat4;
    use std::collections::VecDeque;
    use std::path::Path;
    use winit::keyboard::KeyCode;

    #[derive(Default)]
    struct FakePlatform {
        batches: VecDeque<Vec<InputEvent>>,
        close_requested: bool,
        viewport: (u32, u32),
        titles: Vec<String>,
        captured: bool,
        focused: bool,
        warps: Vec<Vec2>,
        timeouts: Vec<Duration>,
        closed: bool,
    }

    impl FakePlatform {
        fn new() -> Self {
            Self { viewport: (800, 600), focused: true, ..Default::default() }
        }
    }

    impl Platform for FakePlatform {
        fn poll_events(&mut self, input: &mut InputState, timeout: Duration) {
            self.timeouts.push(timeout);
            for event in self.batches.pop_front().unwrap_or_default() {
                input.process_event(&event);
            }
        }

        fn should_close(&self) -> bool {
            self.close_requested
        }

        fn has_focus(&self) -> bool {
            self.focused
        }

        fn viewport_size(&self) -> (u32, u32) {
            self.viewport
        }

        fn set_title(&mut self, title: &str) {
            self.titles.push(title.to_string());
        }

        fn capture_cursor(&mut self) {
            self.captured = true;
        }

        fn warp_cursor(&mut self, position: Vec2) {
            self.warps.push(position);
        }

        fn close(&mut self) {
            self.closed = true;
        }
    }

    #[derive(Default)]
    struct FakeGraphics {
        fail_program: bool,
        next_id: usize,
        live: Vec<usize>,
        destroyed: Vec<usize>,
        draws: usize,
        presents: usize,
        resized: Option<(u32, u32)>,
        last_view_proj: Option<Mat4>,
    }

    impl Graphics for FakeGraphics {
        type Buffers = usize;
        type Program = ();

        fn create_program(&mut self, vertex: &Path, _fragment: &Path) -> Result<(), InitError> {
            if self.fail_program {
                return Err(InitError::ShaderCompile {
                    path: vertex.to_path_buf(),
                    message: "forced".into(),
                });
            }
            Ok(())
        }

        fn create_buffers(&mut self, _mesh: &Mesh) -> usize {
            self.next_id += 1;
            self.live.push(self.next_id);
            self.next_id
        }

        fn destroy_buffers(&mut self, buffers: usize) {
            self.live.retain(|b| *b != buffers);
            self.destroyed.push(buffers);
        }

        fn bind_shader_data(&mut self, view_proj: Mat4, _objects: &[GameObject<usize>]) {
            self.last_view_proj = Some(view_proj);
        }

        fn draw(&mut self, _program: &(), _objects: &[GameObject<usize>], _viewport: (u32, u32)) {
            self.draws += 1;
        }

        fn present(&mut self) {
            self.presents += 1;
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.resized = Some((width, height));
        }
    }

    fn running(platform: FakePlatform) -> Manager<FakePlatform, FakeGraphics> {
        let mut manager = Manager::new(Config::default(), platform, FakeGraphics::default());
        manager.init().expect("init");
        manager
    }

    /// Feed `events` through a poll, as the window would between frames.
    fn deliver(manager: &mut Manager<FakePlatform, FakeGraphics>, events: Vec<InputEvent>) {
        manager.platform.batches.push_back(events);
        manager.late();
    }

    #[test]
    fn init_moves_to_running_and_uploads_scene() {
        let mut manager = Manager::new(Config::default(), FakePlatform::new(), FakeGraphics::default());
        assert_eq!(manager.state(), ProgramState::Starting);

        manager.init().unwrap();
        assert_eq!(manager.state(), ProgramState::Running);
        assert_eq!(manager.graphics().live.len(), 2);
        assert!(manager.platform().captured);
        assert_eq!(manager.scene().map(|s| s.objects.len()), Some(2));
    }

    #[test]
    fn failed_init_stays_starting() {
        let graphics = FakeGraphics { fail_program: true, ..Default::default() };
        let mut manager = Manager::new(Config::default(), FakePlatform::new(), graphics);

        assert!(manager.run().is_err());
        assert_eq!(manager.state(), ProgramState::Starting);
        assert!(manager.graphics().live.is_empty());
    }

    #[test]
    fn state_only_moves_forward() {
        use ProgramState::*;
        assert_eq!(Starting.advance(Running), Running);
        assert_eq!(Running.advance(Starting), Running);
        assert_eq!(Closing.advance(Running), Closing);
        assert_eq!(Closing.advance(Starting), Closing);

        let mut manager = running(FakePlatform::new());
        manager.quit();
        assert_eq!(manager.state(), Closing);
        manager.init().unwrap();
        assert_eq!(manager.state(), Closing);
    }

    #[test]
    fn close_request_ends_the_loop_after_late() {
        let mut manager = running(FakePlatform::new());
        manager.platform.close_requested = true;
        assert_eq!(manager.state(), ProgramState::Running);

        manager.late();
        assert_eq!(manager.state(), ProgramState::Closing);
    }

    #[test]
    fn no_keys_leave_position_unchanged() {
        let mut manager = running(FakePlatform::new());
        let before = manager.camera().eye;
        std::thread::sleep(Duration::from_millis(5));
        manager.early();
        manager.input();
        assert_eq!(manager.camera().eye, before);
    }

    #[test]
    fn held_key_moves_camera() {
        let mut manager = running(FakePlatform::new());
        deliver(&mut manager, vec![InputEvent::KeyDown(KeyCode::KeyW)]);

        let before = manager.camera().eye;
        let forward = manager.camera().forward();
        std::thread::sleep(Duration::from_millis(5));
        manager.early();
        manager.input();

        let moved = manager.camera().eye - before;
        assert!(moved.length() > 0.0);
        assert!(moved.normalize().dot(forward) > 0.999);
    }

    #[test]
    fn cursor_offset_turns_camera_and_recentres() {
        let mut manager = running(FakePlatform::new());
        let yaw = manager.camera().yaw();
        deliver(&mut manager, vec![InputEvent::CursorMoved { x: 450.0, y: 300.0 }]);

        manager.early();
        manager.input();

        let expected = (yaw + 50.0 * manager.config.camera.sensitivity) % 360.0;
        assert!((manager.camera().yaw() - expected).abs() < 1e-4);
        assert_eq!(manager.platform().warps.last(), Some(&Vec2::new(400.0, 300.0)));

        // Re-centred, so the next frame without movement does not turn again
        let yaw = manager.camera().yaw();
        manager.input();
        assert_eq!(manager.camera().yaw(), yaw);
    }

    #[test]
    fn pitch_stays_clamped_through_frames() {
        let mut manager = running(FakePlatform::new());
        for y in [0.0, 600.0, 0.0, 0.0, 600.0, 600.0, 600.0] {
            deliver(&mut manager, vec![InputEvent::CursorMoved { x: 400.0, y }]);
            manager.early();
            manager.input();
            let pitch = manager.camera().pitch();
            assert!((-PITCH_LIMIT..=PITCH_LIMIT).contains(&pitch));
        }
    }

    #[test]
    fn unfocused_window_keeps_cursor_free() {
        let mut manager = running(FakePlatform::new());
        deliver(&mut manager, vec![InputEvent::FocusChanged { focused: false }]);
        manager.early();
        manager.input();
        assert!(manager.platform().warps.is_empty());
    }

    #[test]
    fn escape_release_quits_and_releases_buffers() {
        let mut manager = running(FakePlatform::new());
        deliver(&mut manager, vec![InputEvent::KeyDown(KeyCode::Escape)]);
        manager.frame();
        assert_eq!(manager.state(), ProgramState::Running);

        manager.platform.batches.push_back(vec![InputEvent::KeyUp(KeyCode::Escape)]);
        manager.late();
        manager.frame();

        assert_eq!(manager.state(), ProgramState::Closing);
        assert!(manager.graphics().live.is_empty());
        assert_eq!(manager.graphics().destroyed.len(), 2);
        assert!(manager.platform().closed);
        assert!(manager.scene().is_none());
    }

    #[test]
    fn quit_is_idempotent() {
        let mut manager = running(FakePlatform::new());
        manager.quit();
        manager.quit();
        assert_eq!(manager.graphics().destroyed.len(), 2);
    }

    #[test]
    fn frame_draws_and_presents() {
        let mut manager = running(FakePlatform::new());
        manager.frame();
        manager.frame();
        assert_eq!(manager.graphics().draws, 2);
        assert_eq!(manager.graphics().presents, 2);
        assert_eq!(manager.graphics().last_view_proj, Some(manager.camera().view_proj()));
    }

    #[test]
    fn viewport_change_resizes() {
        let mut manager = running(FakePlatform::new());
        manager.platform.viewport = (1024, 512);
        manager.late();
        assert_eq!(manager.graphics().resized, Some((1024, 512)));
        assert_eq!(manager.camera().aspect, 2.0);
    }

    #[test]
    fn run_stops_on_close_request_and_cleans_up() {
        let mut platform = FakePlatform::new();
        platform.close_requested = true;
        let mut manager = Manager::new(Config::default(), platform, FakeGraphics::default());

        manager.run().unwrap();
        assert_eq!(manager.state(), ProgramState::Closing);
        assert_eq!(manager.graphics().draws, 1);
        assert_eq!(manager.graphics().destroyed.len(), 2);
        assert!(manager.platform().closed);
    }

    #[test]
    fn window_opened_in_background_leaves_cursor_alone() {
        let mut platform = FakePlatform::new();
        platform.focused = false;
        let mut manager = running(platform);

        manager.frame();
        manager.frame();
        assert!(manager.platform().warps.is_empty());

        deliver(&mut manager, vec![InputEvent::FocusChanged { focused: true }]);
        manager.frame();
        assert_eq!(manager.platform().warps.len(), 1);
    }

    #[test]
    fn title_shows_fps_once_a_second() {
        let mut manager = running(FakePlatform::new());
        let start = Instant::now();
        manager.clock = FrameClock::new(start);

        manager.clock.tick(start + Duration::from_millis(500));
        manager.logic();
        assert!(manager.platform().titles.is_empty());

        manager.clock.tick(start + Duration::from_millis(1000));
        manager.logic();
        manager.logic();
        assert_eq!(manager.platform().titles, vec!["flycube | 2 FPS".to_string()]);
    }

    #[test]
    fn minimised_window_skips_drawing_and_waits_for_events() {
        let mut manager = running(FakePlatform::new());
        manager.frame();
        assert_eq!((manager.graphics().draws, manager.graphics().presents), (1, 1));

        manager.platform.viewport = (0, 0);
        manager.frame();
        manager.frame();
        manager.frame();
        assert_eq!(manager.graphics().draws, 2);
        assert_eq!(manager.graphics().presents, 2);
        assert_eq!(manager.graphics().resized, None);
        assert_eq!(manager.platform().timeouts.last(), Some(&MINIMISED_POLL));

        manager.platform.viewport = (800, 600);
        // The restore is seen in late, so drawing resumes on the frame after
        manager.frame();
        manager.frame();
        assert_eq!(manager.graphics().draws, 3);
        assert_eq!(manager.platform().timeouts.last(), Some(&Duration::ZERO));
        assert_eq!(manager.graphics().resized, None);
    }

    #[test]
    fn scene_holds_ground_and_cube() {
        let manager = running(FakePlatform::new());
        let names: Vec<&str> = manager.scene().unwrap().objects.iter().map(|o| o.name).collect();
        assert_eq!(names, vec!["ground", "cube"]);
    }
}
