//! Static evaluation. Positive scores favour Blue, negative favour Red.

use crate::game::{Board, Cell, Piece, Player, Position, Rank};
use crate::movegen::{KNIGHT_OFFSETS, legal_moves};

pub const PIECE_VALUE: i32 = 1;
pub const KNIGHT_BONUS: i32 = 5;
pub const UNSAFE_PENALTY: i32 = 3;
pub const KNIGHT_THREAT_BONUS: i32 = 5;
pub const CAPTURE_MOVE_BONUS: i32 = 10;

const DIAGONALS: [(i32, i32); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

/// Score the position from Blue's point of view.
///
/// Every term is computed once per piece and added with the owner's sign, so
/// swapping the colours of a position negates its score.
pub fn evaluate(board: &Board) -> i32 {
    let mut score = board.points(Player::Blue) as i32 - board.points(Player::Red) as i32;

    for piece in board.pieces_on_board() {
        let value = piece_value(board, piece);
        score += match piece.owner {
            Player::Blue => value,
            Player::Red => -value,
        };
    }

    score
}

fn piece_value(board: &Board, piece: &Piece) -> i32 {
    let Some(at) = piece.position else {
        return 0;
    };

    let mut value = PIECE_VALUE;
    if piece.is_knight() {
        value += KNIGHT_BONUS;
        if threatens_knight_capture(board, piece) {
            value += KNIGHT_THREAT_BONUS;
        }
    }
    if !is_square_safe(board, at, piece.owner) {
        value -= UNSAFE_PENALTY;
    }

    let capturing = legal_moves(board, piece.id)
        .values()
        .filter(|captures| !captures.is_empty())
        .count() as i32;
    value + CAPTURE_MOVE_BONUS * capturing
}

/// Whether a piece of `owner` standing on `at` is out of reach of the
/// opponent's diagonal and knight threats.
pub fn is_square_safe(board: &Board, at: Position, owner: Player) -> bool {
    let opponent = owner.opponent();
    let held_by_opponent = |p: Option<Position>| {
        p.and_then(|p| board.piece_at(p))
            .is_some_and(|piece| piece.owner == opponent)
    };

    for (dr, dc) in DIAGONALS {
        let near = at.offset(dr, dc);
        let far = at.offset(2 * dr, 2 * dc);

        // Adjacent attacker with room to jump in
        if held_by_opponent(near) {
            let landing = near.and_then(|p| p.offset(dr, dc));
            if matches!(landing.and_then(|p| board.get(p)), Some(Cell::Empty)) {
                return false;
            }
        }

        // Attacker two away backed by one of its own in between
        if held_by_opponent(far) && held_by_opponent(near) {
            return false;
        }
    }

    !KNIGHT_OFFSETS.iter().any(|&(dr, dc)| {
        at.offset(dr, dc)
            .and_then(|p| board.piece_at(p))
            .is_some_and(|piece| piece.owner == opponent && piece.rank == Rank::Knight)
    })
}

/// Whether a knight has an enemy piece sitting on one of its offsets.
///
/// `evaluate` only adds this term for knights. A normal piece standing where
/// a knight could jump from captures nothing, so it earns no bonus.
pub fn threatens_knight_capture(board: &Board, piece: &Piece) -> bool {
    let Some(at) = piece.position else {
        return false;
    };
    KNIGHT_OFFSETS.iter().any(|&(dr, dc)| {
        at.offset(dr, dc)
            .and_then(|p| board.piece_at(p))
            .is_some_and(|target| target.owner != piece.owner)
    })
}
