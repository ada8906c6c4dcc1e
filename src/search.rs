//! Depth-bounded minimax with alpha-beta pruning.
//!
//! Blue is the maximizing side because `evaluate` scores from Blue's point of
//! view. Every child position is a clone of its parent, so the caller's board
//! is never touched.

use crate::eval::{evaluate, is_square_safe};
use crate::game::{Board, Move};
use crate::movegen::side_moves;

/// Moves worth searching for the side to move: safe destinations first,
/// captures among those, falling back to the wider set whenever a filter
/// would leave nothing.
pub fn candidate_moves(board: &Board) -> Vec<Move> {
    let moves = side_moves(board, board.turn());

    let safe: Vec<Move> = moves
        .iter()
        .filter(|mv| is_square_safe(board, mv.to, board.piece(mv.piece).owner))
        .cloned()
        .collect();
    let pool = if safe.is_empty() { moves } else { safe };

    let capturing: Vec<Move> = pool.iter().filter(|mv| mv.is_capture()).cloned().collect();
    if capturing.is_empty() { pool } else { capturing }
}

/// Position after `mv` has been played and the turn handed over.
pub fn successor(board: &Board, mv: &Move) -> Board {
    let mut next = board.clone();
    next.apply_move(mv);
    next.change_turn();
    next.check_result(false);
    next
}

/// Returns the minimax value of `board` and the move achieving it.
///
/// # Arguments
/// * `board` - Position to search; the side to move is `board.turn()`
/// * `depth` - Remaining plies
/// * `alpha`, `beta` - Search window; pass `i32::MIN` and `i32::MAX` at the root
/// * `maximizing` - Whether the side to move is the maximizing (Blue) side
///
/// # Returns
/// `(score, None)` at depth zero, on a decided board, or when the side to
/// move has no legal move.
pub fn choose_move(
    board: &Board,
    depth: u8,
    mut alpha: i32,
    mut beta: i32,
    maximizing: bool,
) -> (i32, Option<Move>) {
    if depth == 0 || board.is_game_over() {
        return (evaluate(board), None);
    }

    let moves = candidate_moves(board);
    if moves.is_empty() {
        return (evaluate(board), None);
    }

    let mut best_move = None;

    if maximizing {
        let mut best = i32::MIN;
        for mv in moves {
            let (score, _) = choose_move(&successor(board, &mv), depth - 1, alpha, beta, false);
            if score > best {
                best = score;
                best_move = Some(mv);
            }
            alpha = alpha.max(score);
            if beta <= alpha {
                break;
            }
        }
        (best, best_move)
    } else {
        let mut best = i32::MAX;
        for mv in moves {
            let (score, _) = choose_move(&successor(board, &mv), depth - 1, alpha, beta, true);
            if score < best {
                best = score;
                best_move = Some(mv);
            }
            beta = beta.min(score);
            if beta <= alpha {
                break;
            }
        }
        (best, best_move)
    }
}
