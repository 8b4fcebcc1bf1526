//! The FourRooms environment.
use crate::FourRoomsConfig;
use anyhow::{ensure, Result};
use log::debug;
use relay_core::{record::Record, Act, DiscreteAct, Env, Featurize, GoalEnv, GoalId, Obs, Step};

/// The classic four-rooms wall layout.
pub(crate) const FOUR_ROOMS_LAYOUT: &str = "\
1111111111111
1     1     1
1     1     1
1           1
1     1     1
1     1     1
11 1111     1
1     111 111
1     1     1
1     1     1
1           1
1     1     1
1111111111111";

/// The east doorway of the classic layout, the customary starting goal.
pub const EAST_DOORWAY: GoalId = 62;

/// Observation: the walkable-cell index the agent occupies.
#[derive(Clone, Debug)]
pub struct FourRoomsObs {
    /// Cell index in scan order over walkable cells.
    pub cell: usize,

    /// Total number of walkable cells, for one-hot encoding.
    pub n_cells: usize,
}

impl Obs for FourRoomsObs {}

impl Featurize for FourRoomsObs {
    /// One-hot encoding of the occupied cell.
    fn featurize(&self) -> Vec<f32> {
        let mut feature = vec![0f32; self.n_cells];
        feature[self.cell] = 1.0;
        feature
    }
}

/// The four movement actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FourRoomsAct {
    /// Move one row up.
    Up,

    /// Move one row down.
    Down,

    /// Move one column left.
    Left,

    /// Move one column right.
    Right,
}

impl FourRoomsAct {
    fn delta(self) -> (isize, isize) {
        match self {
            Self::Up => (-1, 0),
            Self::Down => (1, 0),
            Self::Left => (0, -1),
            Self::Right => (0, 1),
        }
    }
}

impl Act for FourRoomsAct {}

impl DiscreteAct for FourRoomsAct {
    fn index(&self) -> usize {
        match self {
            Self::Up => 0,
            Self::Down => 1,
            Self::Left => 2,
            Self::Right => 3,
        }
    }

    fn from_index(ix: usize) -> Self {
        match ix {
            0 => Self::Up,
            1 => Self::Down,
            2 => Self::Left,
            3 => Self::Right,
            _ => panic!("Invalid action index: {}", ix),
        }
    }
}

/// Parsed wall layout.
struct Layout {
    n_cols: usize,
    walls: Vec<bool>,
    /// Walkable cells as (row, col), in scan order.
    cells: Vec<(usize, usize)>,
}

fn parse_layout(layout: &str) -> Result<Layout> {
    let lines: Vec<&str> = layout.lines().collect();
    ensure!(!lines.is_empty(), "empty layout");
    let n_cols = lines[0].len();
    ensure!(
        lines.iter().all(|l| l.len() == n_cols),
        "layout rows differ in length"
    );

    let mut walls = Vec::with_capacity(lines.len() * n_cols);
    let mut cells = Vec::new();
    for (r, line) in lines.iter().enumerate() {
        for (c, ch) in line.chars().enumerate() {
            let wall = ch != ' ';
            walls.push(wall);
            if !wall {
                cells.push((r, c));
            }
        }
    }
    ensure!(!cells.is_empty(), "layout has no walkable cell");

    Ok(Layout {
        n_cols,
        walls,
        cells,
    })
}

/// FourRooms grid world.
///
/// The agent starts each episode in a uniformly random walkable cell other
/// than the goal. Moves into walls leave the agent in place. Reaching the
/// goal yields reward 1.0 and terminates the episode; every other step
/// yields 0.0. With a positive `slip_prob`, each action is replaced by a
/// uniformly random one with that probability.
pub struct FourRooms {
    layout: Layout,
    /// Cell index by grid position, `None` for walls.
    cell_of: Vec<Option<usize>>,
    goal: GoalId,
    agent: usize,
    t: usize,
    max_episode_steps: Option<usize>,
    slip_prob: f32,
    seed: u64,
    rng: fastrand::Rng,
}

impl FourRooms {
    /// Number of walkable cells.
    pub fn n_cells(&self) -> usize {
        self.layout.cells.len()
    }

    /// Grid position (row, col) of a walkable cell.
    pub fn cell_position(&self, cell: usize) -> (usize, usize) {
        self.layout.cells[cell]
    }

    fn observe(&self) -> FourRoomsObs {
        FourRoomsObs {
            cell: self.agent,
            n_cells: self.n_cells(),
        }
    }

    /// Target cell of a move, or the current cell if a wall or the grid
    /// boundary blocks it.
    fn target(&self, from: usize, act: FourRoomsAct) -> usize {
        let (r, c) = self.layout.cells[from];
        let (dr, dc) = act.delta();
        let (r, c) = (r as isize + dr, c as isize + dc);
        if r < 0 || c < 0 || c as usize >= self.layout.n_cols {
            return from;
        }
        match self.cell_of.get(r as usize * self.layout.n_cols + c as usize) {
            Some(Some(cell)) => *cell,
            _ => from,
        }
    }
}

impl Env for FourRooms {
    type Config = FourRoomsConfig;
    type Obs = FourRoomsObs;
    type Act = FourRoomsAct;
    type Info = ();

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        let layout = parse_layout(&config.layout)?;
        ensure!(
            config.goal < layout.cells.len(),
            "goal {} out of range for a layout with {} cells",
            config.goal,
            layout.cells.len()
        );

        let mut cell_of = vec![None; layout.walls.len()];
        for (ix, (r, c)) in layout.cells.iter().enumerate() {
            cell_of[r * layout.n_cols + c] = Some(ix);
        }

        Ok(Self {
            cell_of,
            goal: config.goal,
            agent: 0,
            t: 0,
            max_episode_steps: config.max_episode_steps,
            slip_prob: config.slip_prob,
            seed: seed as u64,
            rng: fastrand::Rng::with_seed(seed as u64),
            layout,
        })
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.t = 0;
        loop {
            self.agent = self.rng.usize(0..self.n_cells());
            if self.agent != self.goal {
                break;
            }
        }
        Ok(self.observe())
    }

    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        self.rng = fastrand::Rng::with_seed(self.seed.wrapping_add(1 + ix as u64));
        self.reset()
    }

    fn step(&mut self, act: &Self::Act) -> (Step<Self>, Record) {
        self.t += 1;

        let act = *act;
        let taken = if self.slip_prob > 0.0 && self.rng.f32() < self.slip_prob {
            FourRoomsAct::from_index(self.rng.usize(0..4))
        } else {
            act
        };
        self.agent = self.target(self.agent, taken);

        let is_terminated = self.agent == self.goal;
        let reward = if is_terminated { 1.0 } else { 0.0 };
        let is_truncated =
            !is_terminated && self.max_episode_steps.map_or(false, |max| self.t >= max);

        let step = Step::new(self.observe(), act, reward, is_terminated, is_truncated, ());
        (step, Record::empty())
    }

    fn render(&self, episode: usize) {
        let mut lines = Vec::new();
        for r in 0..self.layout.walls.len() / self.layout.n_cols {
            let mut line = String::new();
            for c in 0..self.layout.n_cols {
                let ch = match self.cell_of[r * self.layout.n_cols + c] {
                    Some(cell) if cell == self.agent => 'A',
                    Some(cell) if cell == self.goal => 'G',
                    Some(_) => ' ',
                    None => '#',
                };
                line.push(ch);
            }
            lines.push(line);
        }
        debug!("episode {}, step {}:\n{}", episode, self.t, lines.join("\n"));
    }
}

impl GoalEnv for FourRooms {
    fn goal(&self) -> GoalId {
        self.goal
    }

    fn set_goal(&mut self, goal: GoalId) {
        assert!(goal < self.n_cells(), "goal {} out of range", goal);
        self.goal = goal;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORRIDOR: &str = "\
11111
1   1
11111";

    fn corridor(goal: GoalId) -> FourRooms {
        let config = FourRoomsConfig {
            layout: CORRIDOR.to_string(),
            goal,
            max_episode_steps: None,
            slip_prob: 0.0,
        };
        FourRooms::build(&config, 7).unwrap()
    }

    #[test]
    fn classic_layout_shape() {
        let env = FourRooms::build(&FourRoomsConfig::default(), 0).unwrap();
        assert_eq!(env.n_cells(), 104);

        // The default goal sits in the east doorway: walkable above and
        // below, walls left and right.
        assert_eq!(env.cell_position(EAST_DOORWAY), (7, 9));
        assert!(env.cell_of[6 * 13 + 9].is_some());
        assert!(env.cell_of[8 * 13 + 9].is_some());
        assert!(env.cell_of[7 * 13 + 8].is_none());
        assert!(env.cell_of[7 * 13 + 10].is_none());
    }

    #[test]
    fn reaching_the_goal_terminates_with_reward() {
        let mut env = corridor(2);
        env.reset().unwrap();

        let mut rewards = Vec::new();
        for _ in 0..3 {
            let (step, _) = env.step(&FourRoomsAct::Right);
            rewards.push(step.reward);
            if step.is_terminated {
                break;
            }
        }
        assert_eq!(rewards.iter().sum::<f32>(), 1.0);
        assert_eq!(*rewards.last().unwrap(), 1.0);
    }

    #[test]
    fn walls_block_movement() {
        let mut env = corridor(2);
        let obs = env.reset().unwrap();
        let (step, _) = env.step(&FourRoomsAct::Up);
        assert_eq!(step.obs.cell, obs.cell);
        assert!(!step.is_terminated);
    }

    #[test]
    fn step_limit_truncates() {
        let config = FourRoomsConfig {
            layout: CORRIDOR.to_string(),
            goal: 0,
            max_episode_steps: Some(2),
            slip_prob: 0.0,
        };
        let mut env = FourRooms::build(&config, 3).unwrap();
        env.reset().unwrap();

        // Up is always blocked, so the agent never reaches the goal.
        let (step, _) = env.step(&FourRoomsAct::Up);
        assert!(!step.is_done());
        let (step, _) = env.step(&FourRoomsAct::Up);
        assert!(step.is_truncated);
        assert!(!step.is_terminated);
        assert_eq!(step.reward, 0.0);
    }

    #[test]
    fn seeded_resets_are_deterministic_and_avoid_the_goal() {
        let config = FourRoomsConfig::default();
        let mut env = FourRooms::build(&config, 11).unwrap();
        let mut env_ = FourRooms::build(&config, 11).unwrap();

        for ix in 0..50 {
            let obs = env.reset_with_index(ix).unwrap();
            let obs_ = env_.reset_with_index(ix).unwrap();
            assert_eq!(obs.cell, obs_.cell);
            assert_ne!(obs.cell, env.goal());
        }
    }

    #[test]
    fn one_hot_features() {
        let mut env = FourRooms::build(&FourRoomsConfig::default(), 5).unwrap();
        let obs = env.reset().unwrap();
        let feature = obs.featurize();
        assert_eq!(feature.len(), 104);
        assert_eq!(feature.iter().sum::<f32>(), 1.0);
        assert_eq!(feature[obs.cell], 1.0);
    }

    #[test]
    fn set_goal_moves_the_terminal_cell() {
        let mut env = corridor(2);
        env.set_goal(0);
        assert_eq!(env.goal(), 0);
        env.reset().unwrap();

        let mut terminated = false;
        for _ in 0..3 {
            let (step, _) = env.step(&FourRoomsAct::Left);
            if step.is_terminated {
                assert_eq!(step.obs.cell, 0);
                terminated = true;
                break;
            }
        }
        assert!(terminated);
    }
}
