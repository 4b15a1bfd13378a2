use crate::model::{
    constants::*,
    structures::{player::PlayerServerStat, rating_scheme::RatingScheme}
};

/// Calculates the contribution rating of a player on one server.
///
/// The rating is a logarithmic ratio of weighted positive actions (kills,
/// incaps, revives) to weighted negative ones (deaths, falls, team-kills),
/// scaled by a falloff that suppresses low-volume players until they reach
/// the contribution threshold. The result lies in `[0, 1000]`.
///
/// Players without a death that was not a team-kill cannot be rated yet and
/// always score 0.
pub fn rating(stat: &PlayerServerStat, scheme: &RatingScheme) -> f64 {
    if stat.real_deaths() == 0 {
        return 0.0;
    }

    let score = match scheme {
        RatingScheme::Extended => extended(stat),
        RatingScheme::Baseline {
            contribution_threshold
        } => baseline(stat, *contribution_threshold)
    };

    // NaN (degenerate logs) falls through to 0 as well
    if score > 0.0 {
        score
    } else {
        0.0
    }
}

fn extended(stat: &PlayerServerStat) -> f64 {
    let kills = stat.kills as f64;
    let incaps = stat.incaps as f64;
    let revives = stat.revives as f64;
    let falls = stat.falls as f64;
    let tks = stat.tks as f64;
    let real_deaths = stat.real_deaths() as f64;

    // The revive factor is added as a constant here, not multiplied into the
    // revive count. Reproduces the published ratings; do not "fix" without
    // re-baselining the leaderboards.
    let contribution = EXTENDED_KILL_FACTOR * kills + EXTENDED_REVIVE_FACTOR + revives;
    let falloff = log_base(contribution, EXTENDED_CONTRIBUTION_THRESHOLD).min(1.0);

    let top = (EXTENDED_KILL_FACTOR * kills
        + EXTENDED_INCAP_FACTOR * (incaps - kills)
        + EXTENDED_REVIVE_FACTOR * revives)
        .max(1.0);

    let bottom = (EXTENDED_DEATH_FACTOR * real_deaths
        + EXTENDED_FALL_FACTOR * (falls - real_deaths)
        + EXTENDED_TK_FACTOR * tks)
        .max(1.0);

    RATING_SCALE * falloff * contribution_factor(top, bottom)
}

fn baseline(stat: &PlayerServerStat, contribution_threshold: f64) -> f64 {
    let kills = stat.kills as f64;
    // Downs are stored in the incap counter
    let downs = stat.incaps as f64;
    let revives = stat.revives as f64;
    let tks = stat.tks as f64;
    let real_deaths = BASELINE_DEATH_FACTOR * stat.deaths as f64 - BASELINE_TEAMKILLED_FACTOR * stat.tkd as f64;

    if contribution_threshold <= 0.0 {
        return 0.0;
    }

    let falloff = contribution_threshold.min(kills + revives) / contribution_threshold;

    let top = BASELINE_KILL_FACTOR * kills + BASELINE_DOWN_FACTOR * (downs - kills) + BASELINE_REVIVE_FACTOR * revives;
    let bottom = real_deaths + BASELINE_TK_FACTOR * tks;

    if top <= 0.0 || bottom <= 0.0 {
        return 0.0;
    }

    RATING_SCALE * falloff * contribution_factor(top, bottom)
}

fn contribution_factor(top: f64, bottom: f64) -> f64 {
    CONTRIBUTION_FACTOR_CEILING.min((top / bottom).log10() + 1.0)
}

fn log_base(n: f64, base: f64) -> f64 {
    n.ln() / base.ln()
}
