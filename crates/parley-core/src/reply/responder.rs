//! Persona responder: templated reply text for a persona.
//!
//! Replies come from fixed per-persona template tables with a `{message}`
//! placeholder. A cache miss pays an artificial latency standing in for an
//! inference call; a hit returns immediately.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use parley_types::persona::Persona;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use super::cache::ResponseCache;

/// Placeholder replaced by the incoming message text.
const PLACEHOLDER: &str = "{message}";

/// Produces reply text for a message in a persona's voice.
///
/// Implementations never fail: every outcome is a usable reply string.
pub trait ReplyGenerator: Send + Sync {
    fn generate(
        &self,
        text: &str,
        persona: &Persona,
    ) -> impl std::future::Future<Output = String> + Send;
}

/// Template tables for personas with a voice of their own.
fn persona_templates(persona: &Persona) -> Option<&'static [&'static str]> {
    let templates: &'static [&'static str] = match persona {
        Persona::CustomerService => &[
            "Hello! Happy to help with \"{message}\". What exactly can I do for you?",
            "Thanks for reaching out about \"{message}\". I'll find the best solution for you.",
            "I understand your question about \"{message}\". Let me walk you through the details.",
            "Thank you for the feedback: \"{message}\". Every request matters and I'll make sure yours is handled.",
        ],
        Persona::Technical => &[
            "Looking at \"{message}\": I'd approach this from a few angles.",
            "Got your technical question about \"{message}\". There are a few likely causes.",
            "After evaluating \"{message}\", a modular approach looks like the best fix.",
            "\"{message}\" is logged. Here's a detailed breakdown and a proposed solution.",
        ],
        Persona::Humorous => &[
            "Ha, \"{message}\"? That's great! 😄 I had a joke for this... no wait, wrong topic.",
            "\"{message}\" has my circuits giggling. That was a joke, in case you missed it 🤖😂",
            "\"{message}\" - I'm no stand-up comic, but I'll try to make you smile! 🎭",
            "You said \"{message}\" and I laughed so hard I lost my joke database! 😆",
        ],
        Persona::Creative => &[
            "About \"{message}\", I have a few ideas! What if we looked at it from another angle?",
            "\"{message}\" sparks some inspiration. Here are a couple of fresh directions.",
            "I think \"{message}\" could be solved with a more inventive approach.",
            "Wow, \"{message}\" is a creative thought! Let me help you expand on it.",
        ],
        Persona::Advisor => &[
            "For \"{message}\", consider three things: where you are, where you want to be, and what's in between.",
            "In my experience, situations like \"{message}\" call for a balanced approach.",
            "The key to \"{message}\" is a clear, complete plan.",
            "As your advisor: weigh both the short-term and long-term effects of \"{message}\".",
        ],
        Persona::Friendly => &[
            "I understand you're saying: \"{message}\". That's interesting! How can I assist you further?",
            "Thanks for sharing: \"{message}\". I'm here to help with whatever you need!",
            "That's a great point about \"{message}\". What else would you like to discuss?",
            "I appreciate you mentioning \"{message}\". Let me know if you'd like my help with anything specific!",
        ],
        Persona::Professional => &[
            "Thank you for your message regarding \"{message}\". This has been noted for further processing.",
            "I acknowledge your input: \"{message}\". I recommend considering several approaches to this matter.",
            "Regarding \"{message}\", I suggest analyzing this issue from multiple perspectives.",
            "Your concern about \"{message}\" has been received. I'm prepared to offer solutions.",
        ],
        Persona::Funny => &[
            "Oh man, \"{message}\"? That's hilarious! 😄 Did you hear the one about... oh wait, that doesn't apply here.",
            "Speaking of \"{message}\", my circuits are buzzing with laughter! 🤖😂",
            "\"{message}\" - I'm not a comedian, but I'll give it a shot! 🎭 How was that?",
            "You said \"{message}\" - that's so funny I forgot my punchline! 😆",
        ],
        Persona::Motivational => &[
            "\"{message}\" - every challenge is an opportunity in disguise. You've got this! 💪",
            "I believe \"{message}\" can be overcome with determination and the right mindset!",
            "Your journey with \"{message}\" is part of your growth. Keep pushing forward!",
            "Even with \"{message}\", every setback is a setup for a comeback! 🌟",
        ],
        Persona::Custom(_) => return None,
    };
    Some(templates)
}

/// Templates for personas without a table of their own.
const GENERIC_TEMPLATES: &[&str] = &[
    "I've thought about \"{message}\". Here's my take.",
    "Thanks for bringing up \"{message}\". It's worth discussing.",
    "\"{message}\" can be looked at from several angles.",
    "Your input \"{message}\" has been processed. Some thoughts follow.",
    "I can't give a detailed answer on \"{message}\" yet, but I'll keep thinking about it.",
    "To answer \"{message}\" fully I need a bit more detail. Could you tell me more?",
];

/// Templates applicable to `persona`, falling back to the generic list.
pub fn templates_for(persona: &Persona) -> &'static [&'static str] {
    persona_templates(persona).unwrap_or(GENERIC_TEMPLATES)
}

/// Reply used when template rendering fails for any reason.
pub fn fallback_reply(text: &str) -> String {
    format!("I've received your message: \"{text}\". Let me know if there's anything else!")
}

/// Cache-backed template responder.
pub struct PersonaResponder {
    cache: Arc<ResponseCache>,
    latency: Duration,
    rng: Mutex<StdRng>,
}

impl PersonaResponder {
    pub fn new(cache: Arc<ResponseCache>, latency: Duration) -> Self {
        Self::with_rng(cache, latency, StdRng::from_entropy())
    }

    /// Construct with an explicit random source.
    pub fn with_rng(cache: Arc<ResponseCache>, latency: Duration, rng: StdRng) -> Self {
        Self {
            cache,
            latency,
            rng: Mutex::new(rng),
        }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Pick and fill a template. `None` on any internal fault.
    fn render(&self, text: &str, persona: &Persona) -> Option<String> {
        let template = {
            let mut rng = self.rng.lock().ok()?;
            *templates_for(persona).choose(&mut *rng)?
        };
        Some(template.replace(PLACEHOLDER, text))
    }
}

impl ReplyGenerator for PersonaResponder {
    async fn generate(&self, text: &str, persona: &Persona) -> String {
        if let Some(hit) = self.cache.get(text, persona) {
            return hit;
        }

        tokio::time::sleep(self.latency).await;

        match self.render(text, persona) {
            Some(reply) => {
                self.cache.put(text, persona, &reply);
                debug!(persona = %persona, "generated persona reply");
                reply
            }
            None => {
                warn!(persona = %persona, "persona reply generation failed, using fallback");
                fallback_reply(text)
            }
        }
    }
}

impl std::fmt::Debug for PersonaResponder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersonaResponder")
            .field("cache", &self.cache)
            .field("latency", &self.latency)
            .finish()
    }
}
