use anyhow::Context;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::env;
use std::path::PathBuf;
use trajectory_replay::envs::{BaseEnv, RolloutCollector, StepResult};
use trajectory_replay::{BatchView, BufferConfig, TrajectoryBuffer};

// 1-D point mass pushed toward a fixed target.
struct PointMass {
    x: f32,
    v: f32,
    t: usize,
    target: f32,
}

impl PointMass {
    const DT: f32 = 0.1;
    const MASS: f32 = 10.0;
    const MAX_STEPS: usize = 50;

    fn new(target: f32) -> Self {
        PointMass {
            x: 0.0,
            v: 0.0,
            t: 0,
            target,
        }
    }

    fn state(&self) -> Vec<f32> {
        vec![self.x, self.v]
    }
}

impl BaseEnv for PointMass {
    fn reset(&mut self) -> Vec<f32> {
        self.x = 0.0;
        self.v = 0.0;
        self.t = 0;
        self.state()
    }

    fn step(&mut self, action: &[f32]) -> StepResult {
        let force = action[0].clamp(-1.0, 1.0);
        self.v += force / Self::MASS;
        self.x += self.v * Self::DT;
        self.t += 1;
        StepResult {
            next_state: self.state(),
            reward: -(self.x - self.target).abs(),
            done: self.t >= Self::MAX_STEPS,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut save_path: Option<PathBuf> = None;
    let mut n_trajectories: usize = 100;
    let mut batch_size: usize = 256;
    let mut seed: u64 = 0;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => config_path = iter.next().map(PathBuf::from),
            "--save" => save_path = iter.next().map(PathBuf::from),
            "--trajectories" => {
                if let Some(value) = iter.next() {
                    n_trajectories = value.parse().context("--trajectories")?;
                }
            }
            "--batch-size" => {
                if let Some(value) = iter.next() {
                    batch_size = value.parse().context("--batch-size")?;
                }
            }
            "--seed" => {
                if let Some(value) = iter.next() {
                    seed = value.parse().context("--seed")?;
                }
            }
            other => anyhow::bail!("unknown argument: {}", other),
        }
    }

    let config = match &config_path {
        Some(path) => BufferConfig::from_json_file(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => BufferConfig::new(PointMass::MAX_STEPS, 2, 1).with_max_trajectories(1000),
    };
    anyhow::ensure!(
        config.state_dim == 2 && config.action_dim == 1,
        "the point-mass demo needs state_dim = 2 and action_dim = 1"
    );
    let mut buffer = TrajectoryBuffer::from_config(&config)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut env = PointMass::new(0.5);
    let collector = RolloutCollector::new(config.trajectory_length);
    let mut policy_rng = StdRng::seed_from_u64(seed.wrapping_add(1));
    // Uniform on [-1, 1], so every action has log-density -ln 2.
    let mut policy = |_: &[f32]| (vec![policy_rng.gen_range(-1.0f32..1.0)], -(2f32.ln()));
    let trajectories = collector.collect_many(&mut env, &mut policy, n_trajectories);
    buffer.add_trajectories(&trajectories, false)?;
    tracing::info!(stored = buffer.len(), capacity = buffer.capacity(), "filled buffer");

    let samples = buffer.sample(batch_size, &mut rng)?;
    let batch = BatchView::with_schema(samples, buffer.schema().clone());
    let mean_return = batch.monte_carlo_return().mean().unwrap_or(0.0);
    let mean_factor = batch.terminal_factor().mean().unwrap_or(0.0);
    tracing::info!(
        batch_size = batch.len(),
        mean_return,
        mean_terminal_factor = mean_factor,
        "sampled batch"
    );

    if let Some(path) = save_path {
        buffer.save(&path)?;
        tracing::info!(path = %path.display(), "saved buffer");
    }

    Ok(())
}
