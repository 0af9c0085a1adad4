//! Myers O(N·D) shortest edit script.
//!
//! Each step `d` owns its own frontier array, indexed by `k + d`, holding the
//! furthest-reaching `x` on every diagonal `k`. The arena of frontiers is kept
//! so the path can be walked back without re-running the search. Points that
//! would leave the edit grid are never stored.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    Equal(usize),
    Delete(usize),
    Insert(usize),
}

const UNREACHED: isize = -1;

type Frontier = Vec<isize>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    /// From diagonal `k + 1`, consuming one line of `new`.
    Down,
    /// From diagonal `k - 1`, consuming one line of `old`.
    Right,
}

struct Grid {
    n: isize,
    m: isize,
}

impl Grid {
    /// Furthest `x` stored for diagonal `k` in the frontier of step `d`.
    fn at(&self, frontier: &Frontier, d: usize, k: isize) -> isize {
        let d = d as isize;
        if k < -d || k > d {
            return UNREACHED;
        }
        frontier[(k + d) as usize]
    }

    /// How step `d` reaches diagonal `k` from the previous frontier, and the
    /// `x` it lands on before following any snake.
    ///
    /// Classic rule: go down when the `x` on `k - 1` is smaller than the `x`
    /// on `k + 1`; on a tie go right (increasing `x`).
    fn step(&self, prev: &Frontier, d: usize, k: isize) -> Option<(Move, isize)> {
        let from_above = self.at(prev, d - 1, k + 1);
        let from_left = self.at(prev, d - 1, k - 1);

        let down = (from_above != UNREACHED && from_above - k <= self.m).then_some(from_above);
        let right = (from_left != UNREACHED && from_left < self.n).then_some(from_left + 1);

        match (down, right) {
            (Some(x_down), Some(x_right)) => {
                if from_left < from_above {
                    Some((Move::Down, x_down))
                } else {
                    Some((Move::Right, x_right))
                }
            }
            (Some(x), None) => Some((Move::Down, x)),
            (None, Some(x)) => Some((Move::Right, x)),
            (None, None) => None,
        }
    }
}

fn snake<A, B>(old: &[A], new: &[B], mut x: usize, mut y: usize) -> usize
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    while x < old.len() && y < new.len() && old[x].as_ref() == new[y].as_ref() {
        x += 1;
        y += 1;
    }
    x
}

/// Deepest search step attempted. The arena holds `(d + 1)²` entries after
/// step `d`, so this bounds it to about 4M slots.
pub(crate) const MAX_EDIT_STEPS: usize = 2_048;

/// Shortest edit script as single-line operations, or `None` if no path was
/// found within `min(|old| + |new|, MAX_EDIT_STEPS)` steps.
pub(crate) fn shortest_edit<A, B>(old: &[A], new: &[B]) -> Option<Vec<Op>>
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    shortest_edit_within(old, new, MAX_EDIT_STEPS)
}

fn shortest_edit_within<A, B>(old: &[A], new: &[B], step_limit: usize) -> Option<Vec<Op>>
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let grid = Grid {
        n: old.len() as isize,
        m: new.len() as isize,
    };
    let max = (old.len() + new.len()).min(step_limit);

    let x0 = snake(old, new, 0, 0) as isize;
    let mut arena: Vec<Frontier> = vec![vec![x0]];
    if x0 == grid.n && x0 == grid.m {
        return Some(backtrack(&grid, &arena));
    }

    for d in 1..=max {
        let prev = &arena[d - 1];
        let d_i = d as isize;
        let mut frontier: Frontier = vec![UNREACHED; 2 * d + 1];
        let mut done = false;

        let mut k = -d_i;
        while k <= d_i {
            if let Some((_, x)) = grid.step(prev, d, k) {
                let y = x - k;
                let x = snake(old, new, x as usize, y as usize) as isize;
                frontier[(k + d_i) as usize] = x;
                if x == grid.n && x - k == grid.m {
                    done = true;
                    break;
                }
            }
            k += 2;
        }

        arena.push(frontier);
        if done {
            return Some(backtrack(&grid, &arena));
        }
    }

    None
}

fn backtrack(grid: &Grid, arena: &[Frontier]) -> Vec<Op> {
    let mut ops = Vec::with_capacity((grid.n + grid.m) as usize);
    let mut x = grid.n;
    let mut y = grid.m;

    for d in (1..arena.len()).rev() {
        let k = x - y;
        let Some((mv, landed_x)) = grid.step(&arena[d - 1], d, k) else {
            break;
        };

        while x > landed_x {
            x -= 1;
            ops.push(Op::Equal(x as usize));
        }
        match mv {
            Move::Down => {
                y = x - k - 1;
                ops.push(Op::Insert(y as usize));
            }
            Move::Right => {
                x -= 1;
                y = x - (k - 1);
                ops.push(Op::Delete(x as usize));
            }
        }
    }

    while x > 0 {
        x -= 1;
        ops.push(Op::Equal(x as usize));
    }

    ops.reverse();
    ops
}
