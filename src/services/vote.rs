use crate::models::interaction::VoteState;

/// Computes the stored vote after a user requests `requested` while holding `current`.
///
/// Voting is a toggle: repeating the vote you already hold clears it, a different
/// vote replaces it directly, and requesting `None` always clears.
pub fn next_vote_state(current: VoteState, requested: VoteState) -> VoteState {
    match requested {
        VoteState::None => VoteState::None,
        requested if requested == current => VoteState::None,
        requested => requested,
    }
}
