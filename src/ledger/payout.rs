//! Parimutuel payout computation. Pure: no storage, no clock.

use crate::money::Money;
use crate::types::{BetId, UserId};

/// Stake totals for one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pools {
    /// Sum of every bet on the match.
    pub total: Money,
    /// Sum of the bets on the winning team.
    pub winning: Money,
}

impl Pools {
    pub fn losing(&self) -> Money {
        self.total.checked_sub(self.winning).unwrap_or(Money::ZERO)
    }

    /// No one to pay: either nothing was staked or nobody backed the winner.
    pub fn has_no_winners(&self) -> bool {
        !self.total.is_positive() || !self.winning.is_positive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stake {
    pub bet_id: BetId,
    pub user_id: UserId,
    pub amount: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payout {
    pub bet_id: BetId,
    pub user_id: UserId,
    pub amount: Money,
}

/// Pays every winning stake its principal plus a share of the losing pool
/// proportional to `stake / winning`. The share is floored to the cent per
/// bet, so the total never exceeds `pools.total` and the undistributed
/// remainder is under one cent per winning bet.
///
/// Output is ordered by ascending bet id.
pub fn distribute(pools: Pools, winning_stakes: &[Stake]) -> Vec<Payout> {
    if pools.has_no_winners() {
        return Vec::new();
    }

    let winning = i128::from(pools.winning.cents());
    let losing = i128::from(pools.losing().cents());

    let mut stakes = winning_stakes.to_vec();
    stakes.sort_by_key(|s| s.bet_id);

    stakes
        .into_iter()
        .map(|stake| {
            let principal = i128::from(stake.amount.cents());
            // principal <= winning, so share <= losing and fits back into i64.
            let share = principal * losing / winning;
            Payout {
                bet_id: stake.bet_id,
                user_id: stake.user_id,
                amount: Money::from_cents((principal + share) as i64),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stake(bet_id: i64, user_id: i64, cents: i64) -> Stake {
        Stake { bet_id, user_id, amount: Money::from_cents(cents) }
    }

    fn pools(total: i64, winning: i64) -> Pools {
        Pools { total: Money::from_cents(total), winning: Money::from_cents(winning) }
    }

    #[test]
    fn single_winner_takes_the_losing_pool() {
        // 100 on A, 50 on B, A wins.
        let payouts = distribute(pools(15_000, 10_000), &[stake(1, 1, 10_000)]);
        assert_eq!(payouts.len(), 1);
        assert_eq!(payouts[0].amount, Money::from_cents(15_000));
    }

    #[test]
    fn winners_share_in_proportion_to_stake() {
        // 30 and 10 on the winner, 20 lost.
        let payouts = distribute(pools(6_000, 4_000), &[stake(1, 1, 3_000), stake(2, 2, 1_000)]);
        assert_eq!(payouts[0].amount, Money::from_cents(4_500));
        assert_eq!(payouts[1].amount, Money::from_cents(1_500));
    }

    #[test]
    fn rounding_remainder_stays_undistributed() {
        // Three equal winners split 1.00: 33 cents each, 1 cent left over.
        let stakes = [stake(1, 1, 100), stake(2, 2, 100), stake(3, 3, 100)];
        let payouts = distribute(pools(400, 300), &stakes);
        assert!(payouts.iter().all(|p| p.amount == Money::from_cents(133)));
        let paid: Money = payouts.iter().map(|p| p.amount).sum();
        assert_eq!(paid, Money::from_cents(399));
    }

    #[test]
    fn no_winning_stake_means_no_payout() {
        assert!(distribute(pools(5_000, 0), &[]).is_empty());
        assert!(distribute(pools(0, 0), &[]).is_empty());
    }

    #[test]
    fn nobody_lost_returns_principal() {
        let payouts = distribute(pools(2_500, 2_500), &[stake(1, 1, 2_000), stake(2, 2, 500)]);
        assert_eq!(payouts[0].amount, Money::from_cents(2_000));
        assert_eq!(payouts[1].amount, Money::from_cents(500));
    }

    #[test]
    fn output_is_ordered_by_bet_id() {
        let payouts = distribute(pools(300, 200), &[stake(9, 1, 100), stake(4, 2, 100)]);
        let ids: Vec<_> = payouts.iter().map(|p| p.bet_id).collect();
        assert_eq!(ids, vec![4, 9]);
    }

    #[test]
    fn conservation_holds_for_uneven_pools() {
        // Deterministic pseudo-random stakes; xorshift keeps it reproducible.
        let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
        let mut next = move || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            seed
        };

        for _ in 0..200 {
            let winners = (next() % 12 + 1) as usize;
            let stakes: Vec<Stake> = (0..winners)
                .map(|i| stake(i as i64 + 1, i as i64 + 1, (next() % 1_000_000 + 1) as i64))
                .collect();
            let winning: i64 = stakes.iter().map(|s| s.amount.cents()).sum();
            let losing = (next() % 5_000_000 + 1) as i64;
            let p = pools(winning + losing, winning);

            let paid: i64 = distribute(p, &stakes).iter().map(|x| x.amount.cents()).sum();
            assert!(paid <= winning + losing, "paid {paid} > pool {}", winning + losing);
            assert!(paid >= winning, "winners lost principal: {paid} < {winning}");
            assert!(winning + losing - paid < winners as i64, "slack too large");
        }
    }
}
