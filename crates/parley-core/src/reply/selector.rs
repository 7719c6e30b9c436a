//! Bot selection: which bot members answer a message.

use parley_types::config::ResponseStrategy;
use parley_types::conversation::BotMember;
use parley_types::persona::Persona;
use rand::Rng;
use rand::seq::SliceRandom;

/// Keywords that make a persona a good fit for a message.
///
/// Personas without a role in group routing have no keywords and only win
/// through the random fallback.
pub fn persona_keywords(persona: &Persona) -> &'static [&'static str] {
    match persona {
        Persona::CustomerService => &["help", "support", "assist", "problem", "issue", "question"],
        Persona::Technical => &["technical", "code", "bug", "error", "fix", "program", "tech"],
        Persona::Humorous => &["funny", "joke", "laugh", "humor", "hilarious", "fun"],
        Persona::Creative => &["creative", "idea", "innovate", "design", "invent", "imagine"],
        Persona::Advisor => &["advice", "suggest", "recommend", "opinion", "guidance", "help"],
        Persona::Friendly
        | Persona::Professional
        | Persona::Funny
        | Persona::Motivational
        | Persona::Custom(_) => &[],
    }
}

/// Number of `persona` keywords contained in the already case-folded `text`.
pub fn keyword_score(lowered_text: &str, persona: &Persona) -> usize {
    persona_keywords(persona)
        .iter()
        .filter(|kw| lowered_text.contains(*kw))
        .count()
}

/// Pick the bots that should reply to `text` under `strategy`.
///
/// Returns an empty list when there are no bots, otherwise every bot for
/// [`ResponseStrategy::All`] and exactly one for the other strategies.
pub fn select_responders<R: Rng + ?Sized>(
    text: &str,
    bots: &[BotMember],
    strategy: ResponseStrategy,
    rng: &mut R,
) -> Vec<BotMember> {
    if bots.is_empty() {
        return Vec::new();
    }

    match strategy {
        ResponseStrategy::All => bots.to_vec(),
        ResponseStrategy::Random => bots.choose(rng).cloned().into_iter().collect(),
        ResponseStrategy::Smart => match best_keyword_match(text, bots) {
            Some(bot) => vec![bot.clone()],
            None => bots.choose(rng).cloned().into_iter().collect(),
        },
    }
}

/// The bot with the strictly highest nonzero keyword score; the first
/// encountered wins ties.
fn best_keyword_match<'a>(text: &str, bots: &'a [BotMember]) -> Option<&'a BotMember> {
    let lowered = text.to_lowercase();
    let mut best: Option<(&BotMember, usize)> = None;

    for bot in bots {
        let score = keyword_score(&lowered, &bot.persona);
        if score == 0 {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((bot, score)),
        }
    }

    best.map(|(bot, _)| bot)
}
