use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use thiserror::Error;

use crate::movegen;

/// Board size constants
pub const BOARD_SIZE: usize = 12;
/// Rows each side fills with normal pieces at the start.
pub const HOME_ROWS: usize = 4;
/// Depth of the band a knight is dropped into during setup.
pub const KNIGHT_BAND: usize = 3;
/// Turn changes a freshly placed box survives.
pub const BOX_LIFETIME: u8 = 6;
pub const WINNING_POINTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    Red,
    Blue,
}

impl Player {
    pub fn opponent(&self) -> Player {
        match self {
            Player::Red => Player::Blue,
            Player::Blue => Player::Red,
        }
    }

    /// Row delta of a forward step.
    pub fn forward(&self) -> i32 {
        match self {
            Player::Red => 1,
            Player::Blue => -1,
        }
    }

    /// Far edge row where this side's normal pieces score.
    pub fn scoring_row(&self) -> usize {
        match self {
            Player::Red => BOARD_SIZE - 1,
            Player::Blue => 0,
        }
    }

    /// Rows this side's knight may be placed on during setup.
    pub fn home_band(&self) -> Range<usize> {
        match self {
            Player::Red => 0..KNIGHT_BAND,
            Player::Blue => BOARD_SIZE - KNIGHT_BAND..BOARD_SIZE,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Player::Red => "Red",
            Player::Blue => "Blue",
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }

    pub fn in_bounds(&self) -> bool {
        self.row < BOARD_SIZE && self.col < BOARD_SIZE
    }

    /// Relative square, or `None` when it falls off the board.
    pub fn offset(&self, dr: i32, dc: i32) -> Option<Position> {
        let r = self.row as i32 + dr;
        let c = self.col as i32 + dc;
        if r < 0 || r >= BOARD_SIZE as i32 || c < 0 || c >= BOARD_SIZE as i32 {
            return None;
        }
        Some(Position::new(r as usize, c as usize))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rank {
    Normal,
    Knight,
}

/// Index of a piece in the board's arena. Stable across clones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PieceId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub id: PieceId,
    /// Side the piece fights for: decides friend or foe, scoring and its tint.
    pub owner: Player,
    /// Side allowed to pick the piece up and move it.
    pub mover: Player,
    pub rank: Rank,
    pub is_king: bool,
    /// `None` while unplaced, after capture, or after scoring.
    pub position: Option<Position>,
}

impl Piece {
    pub fn is_knight(&self) -> bool {
        self.rank == Rank::Knight
    }

    pub fn is_on_board(&self) -> bool {
        self.position.is_some()
    }

    pub fn can_be_moved_by(&self, player: Player) -> bool {
        self.mover == player
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Occupied(PieceId),
    Box { owner: Player, remaining: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveBox {
    pub position: Position,
    pub owner: Player,
    pub remaining: u8,
}

/// A piece relocation together with every piece it removes, in ray order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub piece: PieceId,
    pub from: Position,
    pub to: Position,
    pub captures: Vec<PieceId>,
}

impl Move {
    pub fn new(piece: PieceId, from: Position, to: Position, captures: Vec<PieceId>) -> Self {
        Move {
            piece,
            from,
            to,
            captures,
        }
    }

    pub fn is_capture(&self) -> bool {
        !self.captures.is_empty()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)?;
        if self.is_capture() {
            write!(f, " x{}", self.captures.len())?;
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid move: {0}")]
    IllegalMove(String),
    #[error("Game already over")]
    GameOver,
    #[error("Not your turn")]
    NotYourTurn,
    #[error("Action not allowed in the current phase")]
    WrongPhase,
    #[error("Position {0} is off the board")]
    OutOfBounds(Position),
    #[error("Cell {0} is not empty")]
    CellOccupied(Position),
    #[error("No piece at {0}")]
    NoPieceAt(Position),
    #[error("{0} already has an active box")]
    BoxAlreadyActive(Player),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    RedWins,
    BlueWins,
    Tie,
}

impl GameResult {
    pub fn win_for(player: Player) -> Self {
        match player {
            Player::Red => GameResult::RedWins,
            Player::Blue => GameResult::BlueWins,
        }
    }

    pub fn winner(&self) -> Option<Player> {
        match self {
            GameResult::RedWins => Some(Player::Red),
            GameResult::BlueWins => Some(Player::Blue),
            GameResult::Tie => None,
        }
    }
}

/// Rule toggles the variants disagree on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    /// Only capturing moves are legal while the side to move has any.
    pub forced_capture: bool,
    /// Reaching the scoring rank crowns the piece instead of scoring it.
    pub king_promotion: bool,
}

/// Arena-indexed board: a fixed grid of cells plus every piece ever created.
///
/// Cloning copies the grid and the piece records in bulk, so a clone keeps
/// the same `PieceId`s and never aliases the original.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
    pieces: Vec<Piece>,
    rules: RuleSet,
    turn: Player,
    red_points: u32,
    blue_points: u32,
    red_captures: u32,
    blue_captures: u32,
    result: Option<GameResult>,
}

impl Board {
    /// Standard opening: both home blocks filled, both knights waiting off-board.
    pub fn new(rules: RuleSet) -> Self {
        let mut board = Board::empty(rules);

        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                if row % 2 != (col + 1) % 2 {
                    continue;
                }
                let owner = if row < HOME_ROWS {
                    Player::Red
                } else if row >= BOARD_SIZE - HOME_ROWS {
                    Player::Blue
                } else {
                    continue;
                };
                let id = board.spawn(owner, Rank::Normal);
                board.set_position(id, Position::new(row, col));
            }
        }

        board.spawn(Player::Red, Rank::Knight);
        board.spawn(Player::Blue, Rank::Knight);
        board
    }

    /// Board with no pieces at all. Red to move.
    pub fn empty(rules: RuleSet) -> Self {
        Board {
            cells: [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE],
            pieces: Vec::new(),
            rules,
            turn: Player::Red,
            red_points: 0,
            blue_points: 0,
            red_captures: 0,
            blue_captures: 0,
            result: None,
        }
    }

    pub fn rules(&self) -> RuleSet {
        self.rules
    }

    pub fn turn(&self) -> Player {
        self.turn
    }

    pub fn set_turn(&mut self, player: Player) {
        self.turn = player;
    }

    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    pub fn is_game_over(&self) -> bool {
        self.result.is_some()
    }

    pub fn points(&self, player: Player) -> u32 {
        match player {
            Player::Red => self.red_points,
            Player::Blue => self.blue_points,
        }
    }

    pub fn captures(&self, player: Player) -> u32 {
        match player {
            Player::Red => self.red_captures,
            Player::Blue => self.blue_captures,
        }
    }

    /// Cell contents, or `None` off the board.
    pub fn get(&self, pos: Position) -> Option<Cell> {
        if pos.in_bounds() {
            Some(self.cells[pos.row][pos.col])
        } else {
            None
        }
    }

    pub fn piece(&self, id: PieceId) -> &Piece {
        &self.pieces[id.0]
    }

    pub fn piece_at(&self, pos: Position) -> Option<&Piece> {
        match self.get(pos) {
            Some(Cell::Occupied(id)) => Some(self.piece(id)),
            _ => None,
        }
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn pieces_on_board(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.iter().filter(|p| p.is_on_board())
    }

    pub fn piece_count(&self, owner: Player) -> usize {
        self.pieces_on_board().filter(|p| p.owner == owner).count()
    }

    pub fn knight(&self, owner: Player) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.is_knight() && p.owner == owner)
    }

    /// Create an unplaced piece.
    pub fn spawn(&mut self, owner: Player, rank: Rank) -> PieceId {
        let id = PieceId(self.pieces.len());
        self.pieces.push(Piece {
            id,
            owner,
            mover: owner,
            rank,
            is_king: false,
            position: None,
        });
        id
    }

    /// Put an unplaced piece onto an empty cell.
    pub fn place(&mut self, id: PieceId, pos: Position) -> Result<(), GameError> {
        match self.get(pos) {
            None => Err(GameError::OutOfBounds(pos)),
            Some(Cell::Empty) => {
                debug_assert!(!self.piece(id).is_on_board(), "piece placed twice");
                self.set_position(id, pos);
                Ok(())
            }
            Some(_) => Err(GameError::CellOccupied(pos)),
        }
    }

    /// Spawn and place in one step.
    pub fn put(&mut self, owner: Player, rank: Rank, pos: Position) -> Result<PieceId, GameError> {
        match self.get(pos) {
            None => Err(GameError::OutOfBounds(pos)),
            Some(Cell::Empty) => {
                let id = self.spawn(owner, rank);
                self.set_position(id, pos);
                Ok(id)
            }
            Some(_) => Err(GameError::CellOccupied(pos)),
        }
    }

    /// Empty a cell, sending any piece on it off the board.
    pub fn clear(&mut self, pos: Position) {
        if !pos.in_bounds() {
            return;
        }
        if let Cell::Occupied(id) = self.cells[pos.row][pos.col] {
            self.pieces[id.0].position = None;
        }
        self.cells[pos.row][pos.col] = Cell::Empty;
    }

    fn set_position(&mut self, id: PieceId, pos: Position) {
        self.cells[pos.row][pos.col] = Cell::Occupied(id);
        self.pieces[id.0].position = Some(pos);
    }

    /// Relocate a piece. A normal piece landing on its scoring rank either
    /// scores and leaves the board (returns `true`) or, under king
    /// promotion, is crowned and stays.
    pub fn move_piece(&mut self, id: PieceId, to: Position) -> bool {
        let piece = self.pieces[id.0];
        if let Some(from) = piece.position {
            debug_assert_eq!(self.cells[from.row][from.col], Cell::Occupied(id));
            self.cells[from.row][from.col] = Cell::Empty;
        }

        let reaches_goal = piece.rank == Rank::Normal && to.row == piece.owner.scoring_row();
        if reaches_goal && !self.rules.king_promotion {
            self.pieces[id.0].position = None;
            match piece.owner {
                Player::Red => self.red_points += 1,
                Player::Blue => self.blue_points += 1,
            }
            return true;
        }
        if reaches_goal {
            self.pieces[id.0].is_king = true;
        }

        self.set_position(id, to);
        false
    }

    /// Take a piece off the board and credit its capture to the other side.
    pub fn capture(&mut self, id: PieceId) {
        let piece = self.pieces[id.0];
        if let Some(pos) = piece.position {
            if self.cells[pos.row][pos.col] == Cell::Occupied(id) {
                self.cells[pos.row][pos.col] = Cell::Empty;
            }
        }
        self.pieces[id.0].position = None;
        match piece.owner {
            Player::Red => self.blue_captures += 1,
            Player::Blue => self.red_captures += 1,
        }
    }

    /// Apply an already validated move. Captured pieces are lifted first, so a
    /// knight lands on the square its victim held.
    pub fn apply_move(&mut self, mv: &Move) {
        debug_assert_eq!(self.piece(mv.piece).position, Some(mv.from));
        for &captured in &mv.captures {
            self.capture(captured);
        }
        self.move_piece(mv.piece, mv.to);
    }

    pub fn add_box(&mut self, pos: Position, owner: Player) -> Result<(), GameError> {
        match self.get(pos) {
            None => Err(GameError::OutOfBounds(pos)),
            Some(Cell::Empty) => {
                self.cells[pos.row][pos.col] = Cell::Box {
                    owner,
                    remaining: BOX_LIFETIME,
                };
                Ok(())
            }
            Some(_) => Err(GameError::CellOccupied(pos)),
        }
    }

    pub fn active_boxes(&self) -> Vec<ActiveBox> {
        let mut boxes = Vec::new();
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                if let Cell::Box { owner, remaining } = self.cells[row][col] {
                    boxes.push(ActiveBox {
                        position: Position::new(row, col),
                        owner,
                        remaining,
                    });
                }
            }
        }
        boxes
    }

    pub fn active_box(&self, owner: Player) -> Option<ActiveBox> {
        self.active_boxes().into_iter().find(|b| b.owner == owner)
    }

    /// Age every box by one turn, freeing the cells of those that expire.
    pub fn tick_boxes(&mut self) {
        for cell in self.cells.iter_mut().flatten() {
            if let Cell::Box { owner, remaining } = *cell {
                *cell = if remaining > 1 {
                    Cell::Box {
                        owner,
                        remaining: remaining - 1,
                    }
                } else {
                    Cell::Empty
                };
            }
        }
    }

    /// Hand the move to the other side and age the boxes.
    pub fn change_turn(&mut self) {
        self.turn = self.turn.opponent();
        self.tick_boxes();
    }

    /// Settle the outcome if the position is decided. Checks run in a fixed
    /// order and the first one that fires wins. A decided board never changes
    /// its result.
    pub fn check_result(&mut self, clock_expired: bool) -> Option<GameResult> {
        if self.result.is_none() {
            self.result = self.decide(clock_expired);
        }
        self.result
    }

    fn decide(&self, clock_expired: bool) -> Option<GameResult> {
        for player in [Player::Red, Player::Blue] {
            if self.points(player) >= WINNING_POINTS {
                return Some(GameResult::win_for(player));
            }
        }

        for player in [Player::Red, Player::Blue] {
            if self.piece_count(player) == 0 {
                return Some(GameResult::win_for(player.opponent()));
            }
        }

        let red = self.piece_count(Player::Red);
        let blue = self.piece_count(Player::Blue);
        if red == 1 && blue == 1 {
            return Some(GameResult::Tie);
        }

        if clock_expired {
            return Some(self.tie_break());
        }

        if movegen::side_moves(self, self.turn).is_empty() {
            return Some(GameResult::Tie);
        }

        None
    }

    /// Decision on time: points, then captures, then a tie.
    fn tie_break(&self) -> GameResult {
        use std::cmp::Ordering;

        let by_points = self.red_points.cmp(&self.blue_points);
        let ordering = if by_points == Ordering::Equal {
            self.red_captures.cmp(&self.blue_captures)
        } else {
            by_points
        };
        match ordering {
            Ordering::Greater => GameResult::RedWins,
            Ordering::Less => GameResult::BlueWins,
            Ordering::Equal => GameResult::Tie,
        }
    }

    /// Get a string representation of the board
    pub fn display(&self) -> String {
        let mut result = String::new();
        result.push_str(&format!(
            "[Red {} pts / {} caps | Blue {} pts / {} caps | {} to move]\n",
            self.red_points, self.red_captures, self.blue_points, self.blue_captures, self.turn
        ));
        result.push_str("   ");
        for col in 0..BOARD_SIZE {
            result.push_str(&format!("{:2} ", col));
        }
        result.push('\n');

        for row in 0..BOARD_SIZE {
            result.push_str(&format!("{:2} ", row));
            for col in 0..BOARD_SIZE {
                let c = match self.cells[row][col] {
                    Cell::Empty => '.',
                    Cell::Box { .. } => '#',
                    Cell::Occupied(id) => {
                        let piece = self.piece(id);
                        match (piece.owner, piece.rank) {
                            (Player::Red, Rank::Normal) => 'r',
                            (Player::Blue, Rank::Normal) => 'b',
                            (Player::Red, Rank::Knight) => 'R',
                            (Player::Blue, Rank::Knight) => 'B',
                        }
                    }
                };
                result.push_str(&format!(" {} ", c));
            }
            result.push('\n');
        }

        result
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(RuleSet::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    #[test]
    fn test_initial_setup() {
        let board = Board::default();

        assert_eq!(board.piece_count(Player::Red), 24);
        assert_eq!(board.piece_count(Player::Blue), 24);
        assert_eq!(board.turn(), Player::Red);

        // Red fills rows 0-3, Blue rows 8-11, on alternating squares
        assert_eq!(board.piece_at(pos(0, 1)).map(|p| p.owner), Some(Player::Red));
        assert_eq!(board.get(pos(0, 0)), Some(Cell::Empty));
        assert_eq!(board.piece_at(pos(11, 0)).map(|p| p.owner), Some(Player::Blue));
        for row in HOME_ROWS..BOARD_SIZE - HOME_ROWS {
            for col in 0..BOARD_SIZE {
                assert_eq!(board.get(pos(row, col)), Some(Cell::Empty));
            }
        }

        // Knights exist but wait off the board
        for owner in [Player::Red, Player::Blue] {
            let knight = board.knight(owner).unwrap();
            assert!(!knight.is_on_board());
            assert_eq!(knight.mover, owner);
        }
    }

    #[test]
    fn test_positions_and_cells_agree() {
        let board = Board::default();
        for piece in board.pieces_on_board() {
            let at = piece.position.unwrap();
            assert_eq!(board.get(at), Some(Cell::Occupied(piece.id)));
        }
    }

    #[test]
    fn test_offset_respects_bounds() {
        assert_eq!(pos(0, 0).offset(-1, 0), None);
        assert_eq!(pos(11, 11).offset(0, 1), None);
        assert_eq!(pos(5, 5).offset(2, -1), Some(pos(7, 4)));
        assert_eq!(Board::default().get(pos(12, 0)), None);
    }

    #[test]
    fn test_place_rejects_occupied_cell() {
        let mut board = Board::empty(RuleSet::default());
        board.put(Player::Red, Rank::Normal, pos(3, 3)).unwrap();
        let other = board.spawn(Player::Blue, Rank::Normal);

        assert_eq!(board.place(other, pos(3, 3)), Err(GameError::CellOccupied(pos(3, 3))));
        assert_eq!(board.place(other, pos(12, 3)), Err(GameError::OutOfBounds(pos(12, 3))));
        board.place(other, pos(4, 3)).unwrap();
        assert_eq!(board.piece(other).position, Some(pos(4, 3)));
    }

    #[test]
    fn test_move_updates_both_sides_of_the_index() {
        let mut board = Board::empty(RuleSet::default());
        let id = board.put(Player::Red, Rank::Normal, pos(2, 2)).unwrap();

        assert!(!board.move_piece(id, pos(3, 2)));

        assert_eq!(board.get(pos(2, 2)), Some(Cell::Empty));
        assert_eq!(board.get(pos(3, 2)), Some(Cell::Occupied(id)));
        assert_eq!(board.piece(id).position, Some(pos(3, 2)));
    }

    #[test]
    fn test_red_scores_on_far_rank() {
        let mut board = Board::empty(RuleSet::default());
        let id = board.put(Player::Red, Rank::Normal, pos(10, 4)).unwrap();

        assert!(board.move_piece(id, pos(11, 4)));

        assert_eq!(board.points(Player::Red), 1);
        assert_eq!(board.piece(id).position, None);
        assert_eq!(board.get(pos(11, 4)), Some(Cell::Empty));
        assert_eq!(board.get(pos(10, 4)), Some(Cell::Empty));
    }

    #[test]
    fn test_blue_scores_on_row_zero() {
        let mut board = Board::empty(RuleSet::default());
        let id = board.put(Player::Blue, Rank::Normal, pos(1, 7)).unwrap();

        assert!(board.move_piece(id, pos(0, 7)));
        assert_eq!(board.points(Player::Blue), 1);
        assert!(!board.piece(id).is_on_board());
    }

    #[test]
    fn test_knight_never_scores() {
        let mut board = Board::empty(RuleSet::default());
        let id = board.put(Player::Red, Rank::Knight, pos(9, 4)).unwrap();

        assert!(!board.move_piece(id, pos(11, 5)));
        assert_eq!(board.points(Player::Red), 0);
        assert_eq!(board.piece(id).position, Some(pos(11, 5)));
    }

    #[test]
    fn test_king_promotion_crowns_instead_of_scoring() {
        let rules = RuleSet {
            king_promotion: true,
            ..RuleSet::default()
        };
        let mut board = Board::empty(rules);
        let id = board.put(Player::Red, Rank::Normal, pos(10, 4)).unwrap();

        assert!(!board.move_piece(id, pos(11, 4)));
        assert_eq!(board.points(Player::Red), 0);
        assert!(board.piece(id).is_king);
        assert_eq!(board.piece(id).position, Some(pos(11, 4)));
    }

    #[test]
    fn test_capture_credits_the_other_side() {
        let mut board = Board::empty(RuleSet::default());
        let blue = board.put(Player::Blue, Rank::Normal, pos(5, 5)).unwrap();
        let red = board.put(Player::Red, Rank::Knight, pos(3, 3)).unwrap();

        board.capture(blue);
        board.capture(red);

        assert_eq!(board.captures(Player::Red), 1);
        assert_eq!(board.captures(Player::Blue), 1);
        assert_eq!(board.get(pos(5, 5)), Some(Cell::Empty));
        assert_eq!(board.piece(red).position, None);
    }

    #[test]
    fn test_box_expires_after_six_turn_changes() {
        let mut board = Board::empty(RuleSet::default());
        board.add_box(pos(6, 6), Player::Blue).unwrap();

        for _ in 0..5 {
            board.change_turn();
        }
        assert_eq!(
            board.get(pos(6, 6)),
            Some(Cell::Box {
                owner: Player::Blue,
                remaining: 1
            })
        );

        board.change_turn();
        assert_eq!(board.get(pos(6, 6)), Some(Cell::Empty));

        board.change_turn();
        assert_eq!(board.get(pos(6, 6)), Some(Cell::Empty));
        assert!(board.active_boxes().is_empty());
    }

    #[test]
    fn test_box_needs_an_empty_cell() {
        let mut board = Board::empty(RuleSet::default());
        board.put(Player::Red, Rank::Normal, pos(4, 4)).unwrap();

        assert_eq!(
            board.add_box(pos(4, 4), Player::Red),
            Err(GameError::CellOccupied(pos(4, 4)))
        );
        board.add_box(pos(4, 5), Player::Red).unwrap();
        assert_eq!(
            board.add_box(pos(4, 5), Player::Blue),
            Err(GameError::CellOccupied(pos(4, 5)))
        );
        assert_eq!(board.active_box(Player::Red).map(|b| b.remaining), Some(BOX_LIFETIME));
        assert_eq!(board.active_box(Player::Blue), None);
    }

    #[test]
    fn test_result_checks_run_in_order() {
        // Score threshold beats the one-piece-each tie
        let mut board = Board::empty(RuleSet::default());
        board.put(Player::Red, Rank::Normal, pos(2, 2)).unwrap();
        board.put(Player::Blue, Rank::Normal, pos(9, 9)).unwrap();
        board.red_points = WINNING_POINTS;
        assert_eq!(board.check_result(false), Some(GameResult::RedWins));

        let mut board = Board::empty(RuleSet::default());
        board.put(Player::Red, Rank::Normal, pos(2, 2)).unwrap();
        board.put(Player::Blue, Rank::Normal, pos(9, 9)).unwrap();
        board.blue_points = WINNING_POINTS;
        assert_eq!(board.check_result(false), Some(GameResult::BlueWins));

        let mut board = Board::empty(RuleSet::default());
        board.put(Player::Red, Rank::Normal, pos(2, 2)).unwrap();
        board.put(Player::Blue, Rank::Normal, pos(9, 9)).unwrap();
        assert_eq!(board.check_result(false), Some(GameResult::Tie));
    }

    #[test]
    fn test_annihilation_hands_the_win_over() {
        let mut board = Board::empty(RuleSet::default());
        board.put(Player::Red, Rank::Normal, pos(2, 2)).unwrap();
        board.put(Player::Red, Rank::Normal, pos(2, 4)).unwrap();
        assert_eq!(board.check_result(false), Some(GameResult::RedWins));

        let mut board = Board::empty(RuleSet::default());
        board.put(Player::Blue, Rank::Normal, pos(9, 9)).unwrap();
        board.put(Player::Blue, Rank::Knight, pos(9, 7)).unwrap();
        let result = board.check_result(false);
        assert_eq!(result, Some(GameResult::win_for(Player::Blue)));
        assert_eq!(result.and_then(|r| r.winner()), Some(Player::Blue));
    }

    #[test]
    fn test_clock_expiry_tie_break() {
        let setup = |red_points, blue_points, red_caps, blue_caps| {
            let mut board = Board::empty(RuleSet::default());
            board.put(Player::Red, Rank::Normal, pos(2, 2)).unwrap();
            board.put(Player::Red, Rank::Normal, pos(2, 4)).unwrap();
            board.put(Player::Blue, Rank::Normal, pos(9, 9)).unwrap();
            board.put(Player::Blue, Rank::Normal, pos(9, 7)).unwrap();
            board.red_points = red_points;
            board.blue_points = blue_points;
            board.red_captures = red_caps;
            board.blue_captures = blue_caps;
            board
        };

        assert_eq!(setup(0, 0, 0, 0).check_result(false), None);
        assert_eq!(setup(2, 1, 0, 5).check_result(true), Some(GameResult::RedWins));
        assert_eq!(setup(1, 1, 0, 5).check_result(true), Some(GameResult::BlueWins));
        assert_eq!(setup(1, 1, 3, 3).check_result(true), Some(GameResult::Tie));
    }

    #[test]
    fn test_result_is_never_unset() {
        let mut board = Board::empty(RuleSet::default());
        board.put(Player::Red, Rank::Normal, pos(2, 2)).unwrap();
        board.put(Player::Blue, Rank::Normal, pos(9, 9)).unwrap();
        assert_eq!(board.check_result(false), Some(GameResult::Tie));

        board.put(Player::Blue, Rank::Normal, pos(9, 7)).unwrap();
        board.blue_points = WINNING_POINTS;
        assert_eq!(board.check_result(true), Some(GameResult::Tie));
    }

    #[test]
    fn test_stalemate_is_a_tie() {
        // Red's pieces are both walled in by boxes
        let mut board = Board::empty(RuleSet::default());
        board.put(Player::Red, Rank::Normal, pos(2, 2)).unwrap();
        board.put(Player::Red, Rank::Normal, pos(2, 4)).unwrap();
        board.add_box(pos(3, 2), Player::Blue).unwrap();
        board.put(Player::Red, Rank::Normal, pos(3, 4)).unwrap();
        board.add_box(pos(4, 4), Player::Blue).unwrap();
        board.put(Player::Blue, Rank::Normal, pos(9, 9)).unwrap();
        board.put(Player::Blue, Rank::Normal, pos(9, 7)).unwrap();

        assert_eq!(board.check_result(false), Some(GameResult::Tie));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut board = Board::default();
        let snapshot = board.clone();
        let id = board.piece_at(pos(3, 0)).unwrap().id;
        board.move_piece(id, pos(4, 0));

        assert_eq!(snapshot.piece(id).position, Some(pos(3, 0)));
        assert_eq!(snapshot.get(pos(4, 0)), Some(Cell::Empty));
    }

    #[test]
    fn test_display_marks_pieces_and_boxes() {
        let mut board = Board::empty(RuleSet::default());
        board.put(Player::Red, Rank::Normal, pos(0, 0)).unwrap();
        board.put(Player::Blue, Rank::Knight, pos(0, 1)).unwrap();
        board.add_box(pos(0, 2), Player::Red).unwrap();

        let text = board.display();
        let first_row = text.lines().nth(2).unwrap();
        assert!(first_row.starts_with(" 0  r  B  #  . "));
    }
}
