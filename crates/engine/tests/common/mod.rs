#![allow(dead_code)]

//! Tic-tac-toe driver shared by the integration suites.
//!
//! South plays the crosses and moves first; moves are cell indices in
//! row-major order. Small enough for exact results, yet it exercises
//! the whole game surface: incremental hashing, the staged move cursor,
//! board diagrams and move notations.

use zermelo::error::Error;
use zermelo::game::{Board, Game, Side};
use zermelo::hashing::Zobrist;

/// Score ceiling of the game.
pub const MAX_SCORE: i32 = 1000;

/// Cell count of the board.
const CELLS: usize = 9;

/// Cell value of a South cross and a North nought.
const CROSS: u8 = 1;
const NOUGHT: u8 = 2;

/// The eight winning lines.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

fn piece(side: Side) -> u8 {
    match side {
        Side::South => CROSS,
        Side::North => NOUGHT,
    }
}

fn side_char(side: Side) -> char {
    match side {
        Side::South => 'S',
        Side::North => 'N',
    }
}

/// Immutable tic-tac-toe position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicTacToeBoard {
    cells: [u8; CELLS],
    turn: Side,
}

impl TicTacToeBoard {
    pub fn empty() -> Self {
        Self { cells: [0; CELLS], turn: Side::South }
    }
}

impl std::fmt::Display for TicTacToeBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_diagram())
    }
}

impl Board for TicTacToeBoard {
    type Move = usize;

    fn turn(&self) -> Side {
        self.turn
    }

    fn to_diagram(&self) -> String {
        let mut diagram = String::with_capacity(CELLS + 2);
        for &cell in &self.cells {
            diagram.push(match cell {
                CROSS => 'X',
                NOUGHT => 'O',
                _ => '.',
            });
        }
        diagram.push(' ');
        diagram.push(side_char(self.turn));
        diagram
    }

    fn from_diagram(diagram: &str) -> Result<Self, Error> {
        let mut parts = diagram.split_whitespace();
        let grid = parts.next().unwrap_or_default();
        let turn = parts.next();

        if grid.chars().count() != CELLS {
            return Err(Error::InvalidPosition(diagram.to_string()));
        }

        let mut cells = [0u8; CELLS];
        for (index, symbol) in grid.chars().enumerate() {
            cells[index] = match symbol {
                'X' => CROSS,
                'O' => NOUGHT,
                '.' => 0,
                _ => return Err(Error::InvalidPosition(diagram.to_string())),
            };
        }

        let turn = match turn {
            Some("S") => Side::South,
            Some("N") => Side::North,
            _ => return Err(Error::InvalidPosition(diagram.to_string())),
        };

        Ok(Self { cells, turn })
    }

    fn to_coordinates(&self, mv: usize) -> String {
        let column = char::from(b'a' + (mv % 3) as u8);
        let row = char::from(b'1' + (mv / 3) as u8);
        format!("{column}{row}")
    }

    fn to_notation(&self, moves: &[usize]) -> String {
        moves
            .iter()
            .map(|&mv| self.to_coordinates(mv))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn to_move(&self, notation: &str) -> Result<usize, Error> {
        let mut chars = notation.chars();
        let column = chars.next();
        let row = chars.next();

        match (column, row, chars.next()) {
            (Some(column @ 'a'..='c'), Some(row @ '1'..='3'), None) => {
                let column = column as usize - 'a' as usize;
                let row = row as usize - '1' as usize;
                Ok(row * 3 + column)
            }
            _ => Err(Error::InvalidMove(notation.to_string())),
        }
    }

    fn to_moves(&self, notation: &str) -> Result<Vec<usize>, Error> {
        notation
            .split_whitespace()
            .map(|part| self.to_move(part))
            .collect()
    }
}

/// Mutable tic-tac-toe match.
pub struct TicTacToe {
    zobrist: Zobrist,
    start: TicTacToeBoard,
    cells: [u8; CELLS],
    turn: Side,
    filled: usize,
    hash: u64,
    history: Vec<usize>,
    cursors: Vec<usize>,
    cursor: usize,
}

impl TicTacToe {
    /// A match starting from the empty board.
    pub fn new() -> Self {
        let mut game = Self {
            zobrist: Zobrist::new(CELLS, 3),
            start: TicTacToeBoard::empty(),
            cells: [0; CELLS],
            turn: Side::South,
            filled: 0,
            hash: 0,
            history: Vec::new(),
            cursors: Vec::new(),
            cursor: 0,
        };
        game.hash = game.full_hash();
        game
    }

    /// A match starting from the given diagram.
    pub fn from_diagram(diagram: &str) -> Result<Self, Error> {
        let board = TicTacToeBoard::from_diagram(diagram)?;
        let mut game = Self::new();
        game.set_board(&board)?;
        Ok(game)
    }

    fn full_hash(&self) -> u64 {
        self.zobrist.hash(&self.cells, self.turn)
    }

    fn line_winner(&self) -> Option<Side> {
        for line in &LINES {
            let [a, b, c] = *line;
            if self.cells[a] != 0 && self.cells[a] == self.cells[b] && self.cells[b] == self.cells[c]
            {
                return Some(if self.cells[a] == CROSS { Side::South } else { Side::North });
            }
        }
        None
    }

    /// Lines still open for a side, weighing lines it already invested
    /// in a little higher.
    fn open_lines(&self, side: Side) -> i32 {
        let own = piece(side);
        let foe = piece(side.flip());
        let mut value = 0;

        for line in &LINES {
            let stones = line.iter().filter(|&&cell| self.cells[cell] == own).count();
            let blocked = line.iter().any(|&cell| self.cells[cell] == foe);
            if !blocked {
                value += 1 + stones as i32;
            }
        }
        value
    }
}

impl Default for TicTacToe {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for TicTacToe {
    type Move = usize;
    type Board = TicTacToeBoard;

    fn length(&self) -> usize {
        self.history.len()
    }

    fn moves(&self) -> &[usize] {
        &self.history
    }

    fn turn(&self) -> Side {
        self.turn
    }

    fn hash(&self) -> u64 {
        self.hash
    }

    fn has_ended(&self) -> bool {
        self.filled == CELLS || self.line_winner().is_some()
    }

    fn winner(&self) -> Option<Side> {
        self.line_winner()
    }

    fn score(&self) -> i32 {
        10 * (self.open_lines(Side::South) - self.open_lines(Side::North))
    }

    fn outcome(&self) -> i32 {
        match self.line_winner() {
            Some(side) => MAX_SCORE * side.sign(),
            None => 0,
        }
    }

    fn contempt(&self) -> i32 {
        0
    }

    fn infinity(&self) -> i32 {
        MAX_SCORE
    }

    fn is_legal(&self, mv: usize) -> bool {
        mv < CELLS && self.cells[mv] == 0 && !self.has_ended()
    }

    fn make_move(&mut self, mv: usize) {
        self.history.push(mv);
        self.cursors.push(self.cursor);
        self.cells[mv] = piece(self.turn);
        self.filled += 1;
        self.hash ^= self.zobrist.key(mv, usize::from(self.cells[mv]));
        self.hash ^= self.zobrist.side_key();
        self.turn = self.turn.flip();
        self.cursor = 0;
    }

    fn unmake_move(&mut self) {
        let mv = self.history.pop().expect("no moves to unmake");
        self.hash ^= self.zobrist.key(mv, usize::from(self.cells[mv]));
        self.hash ^= self.zobrist.side_key();
        self.cells[mv] = 0;
        self.filled -= 1;
        self.turn = self.turn.flip();
        self.cursor = self.cursors.pop().expect("no cursor to restore");
    }

    fn next_move(&mut self) -> Option<usize> {
        if self.has_ended() {
            self.cursor = CELLS;
            return None;
        }
        while self.cursor < CELLS {
            let cell = self.cursor;
            self.cursor += 1;
            if self.cells[cell] == 0 {
                return Some(cell);
            }
        }
        None
    }

    fn legal_moves(&self) -> Vec<usize> {
        if self.has_ended() {
            return Vec::new();
        }
        (0..CELLS).filter(|&cell| self.cells[cell] == 0).collect()
    }

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor;
    }

    fn ensure_capacity(&mut self, n: usize) -> Result<(), Error> {
        if n > CELLS {
            return Err(Error::CapacityExceeded { requested: n, limit: CELLS });
        }
        self.history.reserve(n.saturating_sub(self.history.len()));
        Ok(())
    }

    fn set_board(&mut self, board: &TicTacToeBoard) -> Result<(), Error> {
        self.start = board.clone();
        self.cells = board.cells;
        self.turn = board.turn;
        self.filled = board.cells.iter().filter(|&&cell| cell != 0).count();
        self.history.clear();
        self.cursors.clear();
        self.cursor = 0;
        self.hash = self.full_hash();
        Ok(())
    }

    fn board(&self) -> TicTacToeBoard {
        self.start.clone()
    }

    fn to_board(&self) -> TicTacToeBoard {
        TicTacToeBoard { cells: self.cells, turn: self.turn }
    }

    fn end_match(&mut self) {}

    fn to_centi_pawns(&self, score: i32) -> i32 {
        score / 10
    }
}
