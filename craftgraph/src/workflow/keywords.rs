//! Small keyword dictionaries used when the model is unavailable, plus the
//! local safety hazard table.

use super::ingredient::Category;

const SIZE_WORDS: &[&str] = &[
    "extra large", "extra small", "tiny", "small", "medium", "large", "huge", "mini", "standard",
    "big", "xl",
];

const UNITS: &[&str] = &[
    "ml", "l", "liter", "liters", "litre", "litres", "cl", "oz", "gallon", "gallons", "cm", "mm",
    "m", "in", "inch", "inches", "ft", "foot", "feet", "g", "kg", "lb", "lbs",
];

/// Material keyword → canonical name.
const MATERIALS: &[(&str, &str)] = &[
    ("aluminium", "aluminum"),
    ("aluminum", "aluminum"),
    ("plastic", "plastic"),
    ("pet", "plastic"),
    ("glass", "glass"),
    ("stainless steel", "steel"),
    ("steel", "steel"),
    ("tin", "tin"),
    ("copper", "copper"),
    ("metal", "metal"),
    ("wooden", "wood"),
    ("wood", "wood"),
    ("bamboo", "bamboo"),
    ("cardboard", "cardboard"),
    ("paper", "paper"),
    ("cotton", "cotton"),
    ("denim", "denim"),
    ("wool", "wool"),
    ("fabric", "fabric"),
    ("leather", "leather"),
    ("rubber", "rubber"),
    ("cork", "cork"),
    ("ceramic", "ceramic"),
    ("jute", "jute"),
    ("hemp", "hemp"),
    ("silicone", "silicone"),
    ("foam", "foam"),
];

const CONDITIONS: &[&str] = &[
    "like new", "new", "good", "used", "worn", "damaged", "broken", "clean", "dirty", "rusty",
    "cracked", "faded",
];

/// Checked in this order so that e.g. "glue gun" is a tool, not a fastener.
const CATEGORY_WORDS: &[(Category, &[&str])] = &[
    (
        Category::Tool,
        &[
            "glue gun", "scissors", "knife", "drill", "hammer", "saw", "brush", "needle", "pliers",
            "screwdriver", "stapler", "cutter",
        ],
    ),
    (
        Category::Fastener,
        &[
            "twine", "string", "rope", "tape", "glue", "wire", "nail", "screw", "zip tie", "clip",
            "rubber band", "thread", "velcro", "cord", "staple", "bolt",
        ],
    ),
    (
        Category::Container,
        &[
            "bottle", "jar", "can", "box", "tin", "carton", "jug", "tub", "cup", "bucket",
            "basket", "crate", "container", "bag", "pot", "tray",
        ],
    ),
    (
        Category::Decorative,
        &[
            "ribbon", "paint", "button", "bead", "sequin", "glitter", "sticker", "lace", "shell",
            "feather", "fabric scrap", "yarn",
        ],
    ),
];

/// Pairs that must never be combined.
const HAZARD_PAIRS: &[(&str, &str)] = &[
    ("bleach", "ammonia"),
    ("bleach", "vinegar"),
    ("bleach", "rubbing alcohol"),
    ("hydrogen peroxide", "vinegar"),
];

/// Materials that are unsafe on their own.
const HAZARD_SINGLES: &[&str] = &["asbestos", "lead paint", "mercury"];

/// Words that mean "I don't know" rather than an answer.
const NON_ANSWERS: &[&str] = &[
    "idk", "i don't know", "i dont know", "don't know", "dont know", "no idea", "not sure",
    "unknown", "no clue", "dunno", "whatever", "skip", "pass", "?",
];

const FILLER_PREFIXES: &[&str] = &[
    "it's ", "its ", "it is ", "they're ", "they are ", "that's ", "that is ", "i think ",
    "maybe ", "probably ", "a ", "an ", "the ", "some ",
];

fn tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn word_matches(token: &str, word: &str) -> bool {
    token == word
        || token
            .strip_suffix("es")
            .map(|t| t == word)
            .unwrap_or(false)
        || token.strip_suffix('s').map(|t| t == word).unwrap_or(false)
}

/// Whole-word (plural-tolerant) phrase match.
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    let hay = tokens(text);
    let needle = tokens(phrase);
    if needle.is_empty() || needle.len() > hay.len() {
        return false;
    }
    hay.windows(needle.len())
        .any(|w| w.iter().zip(&needle).all(|(t, n)| word_matches(t, n)))
}

/// Canonical material mentioned in `text`.
pub fn infer_material(text: &str) -> Option<String> {
    MATERIALS
        .iter()
        .find(|(kw, _)| contains_phrase(text, kw))
        .map(|(_, canonical)| canonical.to_string())
}

/// Size word or a number followed by a unit ("500 ml", "30cm").
pub fn infer_size(text: &str) -> Option<String> {
    let toks = tokens(text);
    for (i, tok) in toks.iter().enumerate() {
        let digits_end = tok.find(|c: char| !c.is_ascii_digit()).unwrap_or(tok.len());
        if digits_end == 0 {
            continue;
        }
        let (num, rest) = tok.split_at(digits_end);
        if !rest.is_empty() && UNITS.contains(&rest) {
            return Some(format!("{} {}", num, rest));
        }
        if rest.is_empty() {
            if let Some(unit) = toks.get(i + 1).filter(|u| UNITS.contains(&u.as_str())) {
                return Some(format!("{} {}", num, unit));
            }
        }
    }
    SIZE_WORDS
        .iter()
        .find(|w| contains_phrase(text, w))
        .map(|w| w.to_string())
}

pub fn infer_condition(text: &str) -> Option<String> {
    CONDITIONS
        .iter()
        .find(|w| contains_phrase(text, w))
        .map(|w| w.to_string())
}

/// Heuristic category from an ingredient's name and material.
pub fn infer_category(text: &str) -> Category {
    CATEGORY_WORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| contains_phrase(text, w)))
        .map(|(c, _)| *c)
        .unwrap_or(Category::Other)
}

/// Leading count in a description ("3 plastic water bottles" → 3), defaulting to 1.
pub fn leading_quantity(text: &str) -> u32 {
    text.split_whitespace()
        .next()
        .and_then(|w| w.parse::<u32>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(1)
}

pub fn is_non_answer(answer: &str) -> bool {
    let lower = answer.trim().to_lowercase();
    let stripped = lower.trim_end_matches(|c: char| c == '.' || c == '!');
    stripped.is_empty()
        || NON_ANSWERS.iter().any(|n| {
            stripped.starts_with(n)
                && stripped[n.len()..]
                    .chars()
                    .next()
                    .map_or(true, |c| !c.is_alphanumeric())
        })
}

/// Answer with conversational filler and punctuation removed.
pub fn clean_answer(answer: &str) -> String {
    let mut text = answer
        .trim()
        .trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
        .to_string();
    loop {
        let lower = text.to_lowercase();
        match FILLER_PREFIXES.iter().find(|p| lower.starts_with(*p)) {
            Some(p) => text = text[p.len()..].trim_start().to_string(),
            None => break,
        }
    }
    text
}

/// Hazard descriptions found in `text`.
pub fn hazards_in(text: &str) -> Vec<String> {
    let mut found: Vec<String> = HAZARD_PAIRS
        .iter()
        .filter(|(a, b)| contains_phrase(text, a) && contains_phrase(text, b))
        .map(|(a, b)| format!("combines {} with {}", a, b))
        .collect();
    found.extend(
        HAZARD_SINGLES
            .iter()
            .filter(|h| contains_phrase(text, h))
            .map(|h| format!("uses {}", h)),
    );
    found
}

/// Approximate weight of one reused item by material, in grams.
pub fn typical_weight_grams(material: &str) -> u32 {
    match material {
        "plastic" => 25,
        "aluminum" | "tin" => 15,
        "glass" => 200,
        "cardboard" | "paper" => 50,
        "wood" | "bamboo" => 150,
        "steel" | "metal" | "copper" => 100,
        "cotton" | "denim" | "wool" | "fabric" => 100,
        _ => 50,
    }
}
