use std::collections::BTreeMap;

use escape_engine::{Hinge, Vec3};
use thiserror::Error;

pub(crate) const TILE: f32 = 1.8;
pub(crate) const WALL_CHAR: char = '#';
const DOOR_EDGE_EPSILON: f32 = TILE * 0.02;
const SAFE_SPAWN_RADIUS: usize = 2;
const PLAYER_SPAWN_NAMES: [&str; 3] = ["player", "jugador", "spawn_player"];

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum LayoutError {
    #[error("level grid is empty")]
    EmptyGrid,
    #[error("spawn '{name}' at ({col}, {row}) is outside the {cols}x{rows} grid")]
    SpawnOutOfBounds {
        name: String,
        col: usize,
        row: usize,
        cols: usize,
        rows: usize,
    },
    #[error("door at ({col}, {row}) is outside the {cols}x{rows} grid")]
    DoorOutOfBounds {
        col: usize,
        row: usize,
        cols: usize,
        rows: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DoorPlacement {
    pub(crate) position: Vec3,
    pub(crate) yaw_degrees: f32,
    pub(crate) hinge: Hinge,
}

/// Character grid plus named spawn cells and door cells. Rows may be ragged;
/// the widest row sets the column count.
#[derive(Debug, Clone)]
pub(crate) struct LevelLayout {
    grid: Vec<Vec<char>>,
    cols: usize,
    spawns: BTreeMap<String, (usize, usize)>,
    doors: Vec<(usize, usize)>,
}

impl LevelLayout {
    pub(crate) fn new(
        grid: &[&str],
        spawns: &[(&str, (usize, usize))],
        doors: &[(usize, usize)],
    ) -> Result<Self, LayoutError> {
        let grid: Vec<Vec<char>> = grid.iter().map(|row| row.chars().collect()).collect();
        let cols = grid.iter().map(Vec::len).max().unwrap_or(0);
        if grid.is_empty() || cols == 0 {
            return Err(LayoutError::EmptyGrid);
        }
        let rows = grid.len();

        let mut spawn_map = BTreeMap::new();
        for (name, (col, row)) in spawns {
            if *col >= cols || *row >= rows {
                return Err(LayoutError::SpawnOutOfBounds {
                    name: (*name).to_string(),
                    col: *col,
                    row: *row,
                    cols,
                    rows,
                });
            }
            spawn_map.insert((*name).to_string(), (*col, *row));
        }
        if let Some((col, row)) = doors.iter().find(|(col, row)| *col >= cols || *row >= rows) {
            return Err(LayoutError::DoorOutOfBounds {
                col: *col,
                row: *row,
                cols,
                rows,
            });
        }

        Ok(Self {
            grid,
            cols,
            spawns: spawn_map,
            doors: doors.to_vec(),
        })
    }

    pub(crate) fn cols(&self) -> usize {
        self.cols
    }

    pub(crate) fn rows(&self) -> usize {
        self.grid.len()
    }

    fn cell(&self, col: isize, row: isize) -> Option<char> {
        if col < 0 || row < 0 {
            return None;
        }
        self.grid
            .get(row as usize)
            .and_then(|cells| cells.get(col as usize))
            .copied()
    }

    /// Cells outside the grid are not walls.
    pub(crate) fn is_wall(&self, col: isize, row: isize) -> bool {
        self.cell(col, row) == Some(WALL_CHAR)
    }

    fn is_open(&self, col: isize, row: isize) -> bool {
        self.cell(col, row).is_some_and(|cell| cell != WALL_CHAR)
    }

    pub(crate) fn tile_to_world(&self, col: usize, row: usize) -> Vec3 {
        let cols = self.cols as f32;
        let rows = self.rows() as f32;
        Vec3::new(
            (col as f32 - cols / 2.0) * TILE,
            0.0,
            (rows / 2.0 - row as f32) * TILE,
        )
    }

    pub(crate) fn wall_positions(&self) -> Vec<Vec3> {
        self.grid
            .iter()
            .enumerate()
            .flat_map(|(row, cells)| {
                cells
                    .iter()
                    .enumerate()
                    .filter(|(_, cell)| **cell == WALL_CHAR)
                    .map(move |(col, _)| (col, row))
            })
            .map(|(col, row)| self.tile_to_world(col, row))
            .collect()
    }

    pub(crate) fn spawn_position(&self, name: &str) -> Option<Vec3> {
        self.spawns
            .get(name)
            .map(|(col, row)| self.tile_to_world(*col, *row))
    }

    /// Explicit player spawn when present, otherwise the safe spawn search.
    pub(crate) fn player_spawn(&self) -> Option<Vec3> {
        PLAYER_SPAWN_NAMES
            .iter()
            .find_map(|name| self.spawn_position(name))
            .or_else(|| {
                self.safe_spawn_cell()
                    .map(|(col, row)| self.tile_to_world(col, row))
            })
    }

    /// Open cell farthest (Manhattan) from the nearest wall inside a 5x5
    /// window. Ties go to the first cell in row-major order.
    pub(crate) fn safe_spawn_cell(&self) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize, usize)> = None;
        for (row, cells) in self.grid.iter().enumerate() {
            for col in 0..cells.len() {
                if !self.is_open(col as isize, row as isize) {
                    continue;
                }
                let score = self.nearest_wall_distance(col, row);
                if best.map_or(true, |(best_score, _, _)| score > best_score) {
                    best = Some((score, col, row));
                }
            }
        }
        best.map(|(_, col, row)| (col, row))
    }

    fn nearest_wall_distance(&self, col: usize, row: usize) -> usize {
        let row_range = row.saturating_sub(SAFE_SPAWN_RADIUS)..(row + SAFE_SPAWN_RADIUS + 1).min(self.rows());
        let mut nearest = usize::MAX;
        for other_row in row_range {
            let width = self.grid[other_row].len();
            let col_range = col.saturating_sub(SAFE_SPAWN_RADIUS)..(col + SAFE_SPAWN_RADIUS + 1).min(width);
            for other_col in col_range {
                if self.grid[other_row][other_col] == WALL_CHAR {
                    nearest = nearest.min(row.abs_diff(other_row) + col.abs_diff(other_col));
                }
            }
        }
        nearest
    }

    pub(crate) fn door_placements(&self) -> Vec<DoorPlacement> {
        self.doors
            .iter()
            .map(|(col, row)| self.door_placement(*col, *row))
            .collect()
    }

    /// A door between walls on its left/right runs along x (yaw 0), otherwise
    /// along z (yaw 90). It is pushed toward the wall it hangs on and hinged
    /// on that side.
    pub(crate) fn door_placement(&self, col: usize, row: usize) -> DoorPlacement {
        let (c, r) = (col as isize, row as isize);
        let left = self.is_wall(c - 1, r);
        let right = self.is_wall(c + 1, r);
        let up = self.is_wall(c, r - 1);
        let down = self.is_wall(c, r + 1);
        let half = TILE * 0.5;

        let mut position = self.tile_to_world(col, row);
        let horizontal = left || right;
        let (yaw_degrees, hinge) = if horizontal {
            if left {
                position.x += -half + DOOR_EDGE_EPSILON;
            } else {
                position.x += half - DOOR_EDGE_EPSILON;
            }
            let hinge = if right && !left { Hinge::Right } else { Hinge::Left };
            (0.0, hinge)
        } else {
            if up {
                position.z += half - DOOR_EDGE_EPSILON;
            } else if down {
                position.z += -half + DOOR_EDGE_EPSILON;
            }
            let hinge = if down && !up { Hinge::Right } else { Hinge::Left };
            (90.0, hinge)
        };

        DoorPlacement {
            position,
            yaw_degrees,
            hinge,
        }
    }
}
