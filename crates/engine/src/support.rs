//! Minimal game stubs shared by unit tests.

use crate::error::Error;
use crate::game::{Board, Game, Side};

/// A game stub whose whole position is a hash value; it has no moves.
pub struct HashedGame(pub u64);

#[derive(Clone, PartialEq, Eq)]
pub struct HashedBoard;

impl std::fmt::Display for HashedBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "-")
    }
}

impl Board for HashedBoard {
    type Move = u8;

    fn turn(&self) -> Side {
        Side::South
    }

    fn to_diagram(&self) -> String {
        "-".to_string()
    }

    fn from_diagram(_: &str) -> Result<Self, Error> {
        Ok(HashedBoard)
    }

    fn to_coordinates(&self, mv: u8) -> String {
        mv.to_string()
    }

    fn to_notation(&self, _: &[u8]) -> String {
        String::new()
    }

    fn to_move(&self, s: &str) -> Result<u8, Error> {
        s.parse().map_err(|_| Error::InvalidMove(s.to_string()))
    }

    fn to_moves(&self, _: &str) -> Result<Vec<u8>, Error> {
        Ok(Vec::new())
    }
}

impl Game for HashedGame {
    type Move = u8;
    type Board = HashedBoard;

    fn length(&self) -> usize {
        0
    }

    fn moves(&self) -> &[u8] {
        &[]
    }

    fn turn(&self) -> Side {
        Side::South
    }

    fn hash(&self) -> u64 {
        self.0
    }

    fn has_ended(&self) -> bool {
        false
    }

    fn winner(&self) -> Option<Side> {
        None
    }

    fn score(&self) -> i32 {
        0
    }

    fn outcome(&self) -> i32 {
        0
    }

    fn contempt(&self) -> i32 {
        0
    }

    fn infinity(&self) -> i32 {
        1000
    }

    fn is_legal(&self, _: u8) -> bool {
        false
    }

    fn make_move(&mut self, _: u8) {}

    fn unmake_move(&mut self) {
        panic!("no moves to unmake");
    }

    fn next_move(&mut self) -> Option<u8> {
        None
    }

    fn legal_moves(&self) -> Vec<u8> {
        Vec::new()
    }

    fn cursor(&self) -> usize {
        0
    }

    fn set_cursor(&mut self, _: usize) {}

    fn ensure_capacity(&mut self, _: usize) -> Result<(), Error> {
        Ok(())
    }

    fn set_board(&mut self, _: &HashedBoard) -> Result<(), Error> {
        Ok(())
    }

    fn board(&self) -> HashedBoard {
        HashedBoard
    }

    fn to_board(&self) -> HashedBoard {
        HashedBoard
    }

    fn end_match(&mut self) {}

    fn to_centi_pawns(&self, score: i32) -> i32 {
        score
    }
}

/// Board snapshot of a [`NimGame`]: the pile size and the side to move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NimBoard {
    pub pile: u32,
    pub turn: Side,
}

impl std::fmt::Display for NimBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_diagram())
    }
}

impl Board for NimBoard {
    type Move = u8;

    fn turn(&self) -> Side {
        self.turn
    }

    fn to_diagram(&self) -> String {
        let turn = if self.turn == Side::South { 'S' } else { 'N' };
        format!("{} {}", self.pile, turn)
    }

    fn from_diagram(diagram: &str) -> Result<Self, Error> {
        let mut parts = diagram.split_whitespace();
        let pile = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| Error::InvalidPosition(diagram.to_string()))?;
        let turn = match parts.next() {
            Some("S") => Side::South,
            Some("N") => Side::North,
            _ => return Err(Error::InvalidPosition(diagram.to_string())),
        };
        Ok(NimBoard { pile, turn })
    }

    fn to_coordinates(&self, mv: u8) -> String {
        mv.to_string()
    }

    fn to_notation(&self, moves: &[u8]) -> String {
        moves.iter().map(|m| m.to_string()).collect::<Vec<_>>().join(" ")
    }

    fn to_move(&self, notation: &str) -> Result<u8, Error> {
        match notation.parse() {
            Ok(mv) if (1..=3).contains(&mv) => Ok(mv),
            _ => Err(Error::InvalidMove(notation.to_string())),
        }
    }

    fn to_moves(&self, notation: &str) -> Result<Vec<u8>, Error> {
        notation.split_whitespace().map(|part| self.to_move(part)).collect()
    }
}

/// The subtraction game: take one to three stones, taking the last one
/// wins. A pile that is a multiple of four is lost for the mover, which
/// makes exact results easy to assert.
pub struct NimGame {
    start: NimBoard,
    pile: u32,
    turn: Side,
    history: Vec<u8>,
    cursors: Vec<usize>,
    cursor: usize,
}

impl NimGame {
    pub const INFINITY: i32 = 1000;
    const MAX_CAPACITY: usize = 1024;

    pub fn new(pile: u32) -> Self {
        Self {
            start: NimBoard { pile, turn: Side::South },
            pile,
            turn: Side::South,
            history: Vec::new(),
            cursors: Vec::new(),
            cursor: 0,
        }
    }
}

impl Game for NimGame {
    type Move = u8;
    type Board = NimBoard;

    fn length(&self) -> usize {
        self.history.len()
    }

    fn moves(&self) -> &[u8] {
        &self.history
    }

    fn turn(&self) -> Side {
        self.turn
    }

    fn hash(&self) -> u64 {
        let bit = u64::from(self.turn == Side::North);
        (u64::from(self.pile) + 1) << 1 | bit
    }

    fn has_ended(&self) -> bool {
        self.pile == 0
    }

    fn winner(&self) -> Option<Side> {
        // Whoever took the last stone has just moved.
        self.has_ended().then(|| self.turn.flip())
    }

    fn score(&self) -> i32 {
        let mover = if self.pile % 4 != 0 { 50 } else { -50 };
        mover * self.turn.sign()
    }

    fn outcome(&self) -> i32 {
        match self.winner() {
            Some(side) => Self::INFINITY * side.sign(),
            None => 0,
        }
    }

    fn contempt(&self) -> i32 {
        0
    }

    fn infinity(&self) -> i32 {
        Self::INFINITY
    }

    fn is_legal(&self, mv: u8) -> bool {
        (1..=3).contains(&mv) && u32::from(mv) <= self.pile
    }

    fn make_move(&mut self, mv: u8) {
        self.history.push(mv);
        self.cursors.push(self.cursor);
        self.pile -= u32::from(mv);
        self.turn = self.turn.flip();
        self.cursor = 0;
    }

    fn unmake_move(&mut self) {
        let mv = self.history.pop().expect("no moves to unmake");
        self.pile += u32::from(mv);
        self.turn = self.turn.flip();
        self.cursor = self.cursors.pop().expect("no cursor to restore");
    }

    fn next_move(&mut self) -> Option<u8> {
        while self.cursor < 3 {
            let take = self.cursor as u8 + 1;
            self.cursor += 1;
            if u32::from(take) <= self.pile {
                return Some(take);
            }
        }
        None
    }

    fn legal_moves(&self) -> Vec<u8> {
        (1..=3).filter(|&take| u32::from(take) <= self.pile).collect()
    }

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor;
    }

    fn ensure_capacity(&mut self, n: usize) -> Result<(), Error> {
        if n > Self::MAX_CAPACITY {
            return Err(Error::CapacityExceeded { requested: n, limit: Self::MAX_CAPACITY });
        }
        self.history.reserve(n.saturating_sub(self.history.len()));
        Ok(())
    }

    fn set_board(&mut self, board: &NimBoard) -> Result<(), Error> {
        self.start = board.clone();
        self.pile = board.pile;
        self.turn = board.turn;
        self.history.clear();
        self.cursors.clear();
        self.cursor = 0;
        Ok(())
    }

    fn board(&self) -> NimBoard {
        self.start.clone()
    }

    fn to_board(&self) -> NimBoard {
        NimBoard { pile: self.pile, turn: self.turn }
    }

    fn end_match(&mut self) {}

    fn to_centi_pawns(&self, score: i32) -> i32 {
        score
    }
}
