//! 命名与故事灵感素材

use rand::Rng;
use rand::seq::SliceRandom;

/// 名字前缀
pub const NAME_PREFIXES: &[&str] = &[
    "Whisker", "Mochi", "Pepper", "Biscuit", "Shadow", "Marble", "Clover", "Tofu", "Saffron",
    "Pebble", "Juniper", "Nimbus", "Maple", "Cinder", "Velvet", "Pudding",
];

/// 名字后缀
pub const NAME_SUFFIXES: &[&str] = &[
    "bean", "paws", "tail", "fluff", "whistle", "button", "sprout", "moon", "puff", "berry",
    "dust", "wick", "loaf", "bell",
];

/// 背景故事灵感
pub const BACKSTORY_PROMPTS: &[&str] = &[
    "Once the loyal companion of a lighthouse keeper, this cat still watches the horizon every evening.",
    "Raised in the back room of a bakery, this cat believes every warm box is an oven waiting to be guarded.",
    "This cat arrived during a thunderstorm and has been suspicious of umbrellas ever since.",
    "A former ship's cat who claims to have sailed past the edge of every map.",
    "Found napping in a library's rare book section, this cat considers itself the head archivist.",
    "This cat spent its kittenhood in a greenhouse and still greets every plant by name.",
    "Born in the attic of a travelling theatre troupe, this cat knows exactly when to make an entrance.",
    "Once lost in a snowy forest, this cat was guided home by a very patient fox.",
    "This cat runs an unofficial neighbourhood watch from the top of the garden wall.",
    "A retired competitive sock thief with a collection numbering in the hundreds.",
    "This cat was the night-shift mascot of a train station and still wakes at the sound of whistles.",
    "Adopted by an elderly clockmaker, this cat never misses a single hour's chime.",
];

/// 随机拼出一个名字
pub fn random_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let prefix = NAME_PREFIXES.choose(rng).copied().unwrap_or("Mystery");
    let suffix = NAME_SUFFIXES.choose(rng).copied().unwrap_or("cat");
    format!("{}{}", prefix, suffix)
}

/// 随机挑选一条故事灵感
pub fn random_backstory_prompt<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    BACKSTORY_PROMPTS
        .choose(rng)
        .copied()
        .unwrap_or("This cat has a mysterious past.")
}
