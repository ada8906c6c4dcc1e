//! Legal move generation.
//!
//! Normal pieces slide straight ahead along their column, capturing by
//! jumping a single enemy piece onto the empty cell behind it and chaining
//! further jumps from each landing square. Knights use the eight fixed
//! L-shaped offsets and capture by replacement. Boxes block both.

use std::collections::BTreeMap;

use crate::game::{Board, Cell, Move, Piece, PieceId, Player, Position, Rank};

/// Cells a single slide segment may inspect.
pub const FORWARD_REACH: i32 = 3;

pub const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (2, 1),
    (1, 2),
    (-1, 2),
    (-2, 1),
    (-2, -1),
    (-1, -2),
    (1, -2),
    (2, -1),
];

/// Destination -> captured pieces in the order they are jumped.
pub type MoveSet = BTreeMap<Position, Vec<PieceId>>;

/// Every destination the piece can reach, capturing or not, ignoring the
/// forced-capture toggle. Empty for pieces that are off the board.
pub fn legal_moves(board: &Board, id: PieceId) -> MoveSet {
    let mut moves = MoveSet::new();
    let piece = board.piece(id);
    let Some(from) = piece.position else {
        return moves;
    };

    match piece.rank {
        Rank::Knight => knight_moves(board, piece.owner, from, &mut moves),
        Rank::Normal => {
            for dir in slide_directions(piece) {
                slide(board, piece.owner, from, dir, &[], &mut moves);
            }
        }
    }

    moves
}

/// `legal_moves` narrowed by the forced-capture toggle: when the piece's side
/// has a capture anywhere, only capturing destinations survive.
pub fn selectable_moves(board: &Board, id: PieceId) -> MoveSet {
    let mut moves = legal_moves(board, id);
    if board.rules().forced_capture && has_capture(board, board.piece(id).mover) {
        moves.retain(|_, captures| !captures.is_empty());
    }
    moves
}

/// All moves for the pieces `player` may move, including its knight.
pub fn side_moves(board: &Board, player: Player) -> Vec<Move> {
    let mut moves = Vec::new();

    for piece in board.pieces_on_board() {
        if !piece.can_be_moved_by(player) {
            continue;
        }
        let Some(from) = piece.position else {
            continue;
        };
        for (to, captures) in legal_moves(board, piece.id) {
            moves.push(Move::new(piece.id, from, to, captures));
        }
    }

    if board.rules().forced_capture && moves.iter().any(Move::is_capture) {
        moves.retain(Move::is_capture);
    }

    moves
}

pub fn has_capture(board: &Board, player: Player) -> bool {
    board
        .pieces_on_board()
        .filter(|p| p.can_be_moved_by(player))
        .any(|p| legal_moves(board, p.id).values().any(|c| !c.is_empty()))
}

fn slide_directions(piece: &Piece) -> impl Iterator<Item = i32> {
    let forward = piece.owner.forward();
    let count = if piece.is_king { 2 } else { 1 };
    [forward, -forward].into_iter().take(count)
}

/// Scan one segment of a slide. `chain` holds the captures made by earlier
/// segments; once it is non-empty only further captures may extend the move.
/// Returns whether any destination was recorded from this segment onwards.
fn slide(
    board: &Board,
    owner: Player,
    from: Position,
    dir: i32,
    chain: &[PieceId],
    moves: &mut MoveSet,
) -> bool {
    let mut pending: Option<PieceId> = None;

    for step in 1..=FORWARD_REACH {
        let Some(pos) = from.offset(dir * step, 0) else {
            break;
        };

        match board.get(pos) {
            Some(Cell::Empty) => {
                return match pending {
                    None if chain.is_empty() => {
                        moves.insert(pos, Vec::new());
                        true
                    }
                    None => false,
                    Some(captured) => {
                        let mut captures = chain.to_vec();
                        captures.push(captured);
                        // The longest chain along the ray replaces its prefix
                        if !slide(board, owner, pos, dir, &captures, moves) {
                            moves.insert(pos, captures);
                        }
                        true
                    }
                };
            }
            Some(Cell::Occupied(id)) if pending.is_none() && board.piece(id).owner != owner => {
                pending = Some(id);
            }
            // Box, friendly piece, or a second piece right behind the first
            _ => break,
        }
    }

    false
}

fn knight_moves(board: &Board, owner: Player, from: Position, moves: &mut MoveSet) {
    for (dr, dc) in KNIGHT_OFFSETS {
        let Some(to) = from.offset(dr, dc) else {
            continue;
        };
        match board.get(to) {
            Some(Cell::Empty) => {
                moves.insert(to, Vec::new());
            }
            Some(Cell::Occupied(id)) if board.piece(id).owner != owner => {
                moves.insert(to, vec![id]);
            }
            _ => {}
        }
    }
}
