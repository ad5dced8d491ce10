use std::str::FromStr;

use glam::Mat4;

use crate::utils::Mesh;
use super::input::InputState;
use super::transform::{rotation_angle, world_matrix};

/// What the frame loop needs from the GPU side
pub trait GraphicsBackend {
    /// Handle to uploaded geometry, valid for the backend's lifetime
    type Mesh;
    type Error;

    fn create_mesh(&mut self, mesh: &Mesh) -> Self::Mesh;

    fn set_world_uniform(&mut self, world: Mat4);

    /// Clear colour and depth, bind the mesh and its texture, draw `index_count` indices
    fn draw_indexed(&mut self, mesh: &Self::Mesh, index_count: u32) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Paused,
}

impl LoopState {
    pub fn of(input: &InputState) -> Self {
        if input.paused { LoopState::Paused } else { LoopState::Running }
    }
}

/// How the angle continues after a pause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResumeMode {
    /// Recompute from absolute time; the donut jumps by the paused duration
    #[default]
    WallClock,
    /// Subtract paused time so rotation continues where it stopped
    Seamless,
}

impl FromStr for ResumeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wall-clock" | "wallclock" | "wall_clock" => Ok(ResumeMode::WallClock),
            "seamless" => Ok(ResumeMode::Seamless),
            other => Err(format!("unknown resume mode `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// World matrix recomputed and the mesh drawn
    Drawn,
    /// Paused: nothing recomputed, last matrix kept
    Held,
}

/// Per-frame driver: RUNNING recomputes the world matrix and draws, PAUSED holds.
///
/// The state is sampled from `InputState::paused` at the top of every tick,
/// so a toggle never lands mid-frame.
pub struct FrameLoopContext<B: GraphicsBackend> {
    mesh: B::Mesh,
    index_count: u32,
    state: LoopState,
    world: Mat4,
    angle: f64,
    period: f64,
    resume_mode: ResumeMode,
    paused_at: Option<f64>,
    paused_total: f64,
    frames_drawn: u64,
}

impl<B: GraphicsBackend> FrameLoopContext<B> {
    /// Upload the mesh once and start in RUNNING
    pub fn new(backend: &mut B, mesh: &Mesh, period: f64, resume_mode: ResumeMode) -> Self {
        let handle = backend.create_mesh(mesh);
        Self {
            mesh: handle,
            index_count: mesh.index_count(),
            state: LoopState::Running,
            world: Mat4::IDENTITY,
            angle: 0.0,
            period,
            resume_mode,
            paused_at: None,
            paused_total: 0.0,
            frames_drawn: 0,
        }
    }

    /// Run one frame at `elapsed` seconds since startup
    pub fn tick(
        &mut self,
        elapsed: f64,
        input: &InputState,
        backend: &mut B,
    ) -> Result<FrameOutcome, B::Error> {
        let next = LoopState::of(input);
        if next != self.state {
            self.transition(next, elapsed);
        }

        match self.state {
            LoopState::Running => {
                self.angle = rotation_angle(elapsed - self.paused_total, self.period);
                self.world = world_matrix(self.angle, input);

                backend.set_world_uniform(self.world);
                backend.draw_indexed(&self.mesh, self.index_count)?;
                self.frames_drawn += 1;
                Ok(FrameOutcome::Drawn)
            }
            LoopState::Paused => Ok(FrameOutcome::Held),
        }
    }

    fn transition(&mut self, next: LoopState, elapsed: f64) {
        match next {
            LoopState::Paused => {
                self.paused_at = Some(elapsed);
                tracing::info!(angle = self.angle, frames_drawn = self.frames_drawn, "render loop paused");
            }
            LoopState::Running => {
                if let (ResumeMode::Seamless, Some(since)) = (self.resume_mode, self.paused_at) {
                    self.paused_total += (elapsed - since).max(0.0);
                }
                self.paused_at = None;
                tracing::info!(resume_mode = ?self.resume_mode, "render loop resumed");
            }
        }
        self.state = next;
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Matrix sent with the most recent drawn frame
    pub fn world(&self) -> Mat4 {
        self.world
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn mesh(&self) -> &B::Mesh {
        &self.mesh
    }

    #[cfg(test)]
    fn index_count(&self) -> u32 {
        self.index_count
    }

    #[cfg(test)]
    fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TorusParameters;
    use glam::Vec3;
    use std::f64::consts::PI;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        CreateMesh { vertices: usize, indices: usize },
        SetWorld(Mat4),
        Draw { mesh: usize, index_count: u32 },
    }

    #[derive(Default)]
    struct RecordingBackend {
        calls: Vec<Call>,
        meshes: usize,
        fail_draw: bool,
    }

    impl RecordingBackend {
        fn take(&mut self) -> Vec<Call> {
            std::mem::take(&mut self.calls)
        }
    }

    impl GraphicsBackend for RecordingBackend {
        type Mesh = usize;
        type Error = &'static str;

        fn create_mesh(&mut self, mesh: &Mesh) -> usize {
            self.calls.push(Call::CreateMesh {
                vertices: mesh.vertices.len(),
                indices: mesh.indices.len(),
            });
            self.meshes += 1;
            self.meshes - 1
        }

        fn set_world_uniform(&mut self, world: Mat4) {
            self.calls.push(Call::SetWorld(world));
        }

        fn draw_indexed(&mut self, mesh: &usize, index_count: u32) -> Result<(), &'static str> {
            if self.fail_draw {
                return Err("surface lost");
            }
            self.calls.push(Call::Draw { mesh: *mesh, index_count });
            Ok(())
        }
    }

    fn setup(resume_mode: ResumeMode) -> (RecordingBackend, FrameLoopContext<RecordingBackend>) {
        let mut backend = RecordingBackend::default();
        let mesh = TorusParameters::default().generate().unwrap();
        let ctx = FrameLoopContext::new(&mut backend, &mesh, 6.0, resume_mode);
        (backend, ctx)
    }

    #[test]
    fn mesh_uploaded_once() {
        let (mut backend, ctx) = setup(ResumeMode::WallClock);
        assert_eq!(backend.take(), vec![Call::CreateMesh { vertices: 544, indices: 3072 }]);
        assert_eq!(ctx.index_count(), 3072);
        assert_eq!(ctx.state(), LoopState::Running);
    }

    #[test]
    fn running_frame_uploads_world_then_draws() {
        let (mut backend, mut ctx) = setup(ResumeMode::WallClock);
        backend.take();

        let input = InputState { translation: Vec3::new(2.0, 0.0, 0.0), paused: false };
        let outcome = ctx.tick(3.0, &input, &mut backend).unwrap();
        assert_eq!(outcome, FrameOutcome::Drawn);

        let expected = Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0))
            * Mat4::from_rotation_y(std::f32::consts::PI);
        match backend.take().as_slice() {
            [Call::SetWorld(world), Call::Draw { mesh: 0, index_count: 3072 }] => {
                assert!(world.abs_diff_eq(expected, 1e-6));
            }
            calls => panic!("unexpected calls {calls:?}"),
        }
        assert!((ctx.angle() - PI).abs() < 1e-12);
        assert_eq!(ctx.frames_drawn(), 1);
    }

    #[test]
    fn paused_frames_hold_the_last_matrix() {
        let (mut backend, mut ctx) = setup(ResumeMode::WallClock);
        let mut input = InputState::default();
        ctx.tick(1.0, &input, &mut backend).unwrap();
        let held = ctx.world();
        backend.take();

        input.paused = true;
        input.translation = Vec3::new(0.0, 3.0, 0.0);
        for frame in 0..10 {
            let outcome = ctx.tick(1.5 + frame as f64, &input, &mut backend).unwrap();
            assert_eq!(outcome, FrameOutcome::Held);
        }

        assert_eq!(ctx.state(), LoopState::Paused);
        assert!(backend.take().is_empty());
        assert_eq!(ctx.world(), held);
        assert_eq!(ctx.frames_drawn(), 1);
    }

    #[test]
    fn wall_clock_resume_jumps_by_paused_time() {
        let (mut backend, mut ctx) = setup(ResumeMode::WallClock);
        let mut input = InputState::default();
        ctx.tick(1.0, &input, &mut backend).unwrap();

        input.paused = true;
        ctx.tick(2.0, &input, &mut backend).unwrap();
        input.paused = false;
        ctx.tick(4.0, &input, &mut backend).unwrap();

        assert_eq!(ctx.state(), LoopState::Running);
        assert!((ctx.angle() - rotation_angle(4.0, 6.0)).abs() < 1e-12);
        assert!(ctx.world().abs_diff_eq(world_matrix(rotation_angle(4.0, 6.0), &input), 1e-6));
    }

    #[test]
    fn seamless_resume_skips_paused_time() {
        let (mut backend, mut ctx) = setup(ResumeMode::Seamless);
        let mut input = InputState::default();
        ctx.tick(1.0, &input, &mut backend).unwrap();

        input.paused = true;
        ctx.tick(2.0, &input, &mut backend).unwrap();
        ctx.tick(3.0, &input, &mut backend).unwrap();
        input.paused = false;
        ctx.tick(4.0, &input, &mut backend).unwrap();

        // paused from t=2 to t=4
        assert!((ctx.angle() - rotation_angle(2.0, 6.0)).abs() < 1e-12);
    }

    #[test]
    fn angle_never_decreases_while_running() {
        for mode in [ResumeMode::WallClock, ResumeMode::Seamless] {
            let (mut backend, mut ctx) = setup(mode);
            let mut input = InputState::default();
            let mut last = 0.0;
            for frame in 0..200 {
                input.paused = (frame / 25) % 2 == 1;
                let outcome = ctx.tick(frame as f64 / 60.0, &input, &mut backend).unwrap();
                if outcome == FrameOutcome::Drawn {
                    assert!(ctx.angle() >= last);
                    last = ctx.angle();
                }
            }
        }
    }

    #[test]
    fn backend_errors_propagate() {
        let (mut backend, mut ctx) = setup(ResumeMode::WallClock);
        backend.fail_draw = true;
        assert_eq!(ctx.tick(0.5, &InputState::default(), &mut backend), Err("surface lost"));
        assert_eq!(ctx.frames_drawn(), 0);
    }

    #[test]
    fn resume_mode_parses() {
        assert_eq!("seamless".parse::<ResumeMode>(), Ok(ResumeMode::Seamless));
        assert_eq!("Wall-Clock".parse::<ResumeMode>(), Ok(ResumeMode::WallClock));
        assert!("later".parse::<ResumeMode>().is_err());
    }
}
