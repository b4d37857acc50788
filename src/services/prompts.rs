//! 提示词模板

use crate::llm::ChatPrompt;
use crate::models::PersonalityType;

use super::catalog::{NAME_PREFIXES, NAME_SUFFIXES};

const PERSONALITY_SHAPE: &str = r#"{
  "personalityType": {
    "code": "The 4-letter Myers-Briggs personality type code (e.g., INFJ, ESTP)",
    "title": "The title of this personality type (e.g., 'The Advocate', 'The Entrepreneur')"
  }
}"#;

const ATTRIBUTES_SHAPE: &str = r#"{
  "dndAttributes": {
    "strength": (integer between 1-20),
    "dexterity": (integer between 1-20),
    "constitution": (integer between 1-20),
    "intelligence": (integer between 1-20),
    "wisdom": (integer between 1-20),
    "charisma": (integer between 1-20)
  }
}"#;

const BASIC_INFO_SHAPE: &str = r#"{
  "personalityType": {
    "code": "The 4-letter Myers-Briggs personality type code (e.g., INFJ, ESTP)",
    "title": "The title of this personality type (e.g., 'The Advocate', 'The Entrepreneur')"
  },
  "dndAttributes": {
    "strength": (integer between 1-20),
    "dexterity": (integer between 1-20),
    "constitution": (integer between 1-20),
    "intelligence": (integer between 1-20),
    "wisdom": (integer between 1-20),
    "charisma": (integer between 1-20)
  }
}"#;

const DETAILS_SHAPE: &str = r#"{
  "backstory": "A compelling 2-3 paragraph backstory that expands on the provided prompt and explains the cat's personality and notable quirks",
  "personalityType": {
    "code": "The 4-letter Myers-Briggs personality type code (e.g., INFJ, ESTP)",
    "title": "The title of this personality type (e.g., 'The Advocate', 'The Entrepreneur')"
  },
  "dndAttributes": {
    "strength": (integer between 1-20),
    "dexterity": (integer between 1-20),
    "constitution": (integer between 1-20),
    "intelligence": (integer between 1-20),
    "wisdom": (integer between 1-20),
    "charisma": (integer between 1-20)
  },
  "timeline": [
    {
      "age": "The age of the cat when the event occurred (e.g., '2 months', '1 year')",
      "description": "Description of a significant event in the cat's life"
    }
  ]
}"#;

fn personality_label(personality: Option<&PersonalityType>) -> (String, String) {
    match personality {
        Some(p) => (p.code.clone(), p.title.clone()),
        None => ("unknown".to_string(), "unknown type".to_string()),
    }
}

pub fn name(image: &str) -> ChatPrompt {
    let prefixes = NAME_PREFIXES.join(", ");
    let suffixes = NAME_SUFFIXES.join(", ");
    ChatPrompt::new(
        format!(
            "You are a cat naming expert. Based on the image of a cat, suggest which name from the following options fits best. \
             Combine ONE prefix with ONE suffix. Prefixes: {prefixes}. Suffixes: {suffixes}. \
             Return a JSON object with a single 'name' field containing the selected name."
        ),
        format!(
            "Please select the best name for this cat from the following options. Combine ONE prefix with ONE suffix:\n\n\
             Prefixes: {prefixes}\nSuffixes: {suffixes}\n\nWhat name best suits this cat?"
        ),
    )
    .with_image(image)
    .json()
}

pub fn personality(image: &str, name: &str, inspiration: &str) -> ChatPrompt {
    ChatPrompt::new(
        format!(
            "You are a cat personality expert. Based on the image of the cat named {name}, determine its Myers-Briggs personality type.\n\n\
             Return a JSON object with ONLY the following structure:\n{PERSONALITY_SHAPE}"
        ),
        format!(
            "This is an image of a cat named {name}. Using this prompt as inspiration: \"{inspiration}\", \
             determine the cat's Myers-Briggs personality type (with both the 4-letter code and the personality title)."
        ),
    )
    .with_image(image)
    .json()
}

pub fn attributes(
    image: &str,
    name: &str,
    personality: &PersonalityType,
    inspiration: &str,
) -> ChatPrompt {
    let (code, title) = (&personality.code, &personality.title);
    ChatPrompt::new(
        format!(
            "You are a cat personality expert who specializes in translating feline traits into RPG attributes. \
             Based on the image of the cat named {name} with personality type {code} ({title}), determine its D&D attributes.\n\n\
             Return a JSON object with ONLY the following structure:\n{ATTRIBUTES_SHAPE}"
        ),
        format!(
            "This is an image of a cat named {name} with personality type {code} ({title}). Using this prompt as inspiration: \
             \"{inspiration}\", assign Dungeons & Dragons attributes (strength, dexterity, constitution, intelligence, wisdom, charisma) \
             on a scale of 1-20 that would match this cat's appearance and personality type."
        ),
    )
    .with_image(image)
    .json()
}

pub fn basic_info(image: &str, name: &str, inspiration: &str) -> ChatPrompt {
    ChatPrompt::new(
        format!(
            "You are a cat personality expert. Based on the image of the cat named {name}, determine its personality type and attributes.\n\n\
             Return a JSON object with ONLY the following structure:\n{BASIC_INFO_SHAPE}"
        ),
        format!(
            "This is an image of a cat named {name}. Using this prompt as inspiration: \"{inspiration}\", determine the cat's \
             Myers-Briggs personality type (with both the 4-letter code and the personality title), and assign Dungeons & Dragons \
             attributes (strength, dexterity, constitution, intelligence, wisdom, charisma) on a scale of 1-20."
        ),
    )
    .with_image(image)
    .json()
}

pub fn details(image: &str, name: &str, inspiration: &str) -> ChatPrompt {
    ChatPrompt::new(
        format!(
            "You are a creative writer and cat personality expert. Based on the image of the cat named {name}, create an engaging \
             backstory and assign personality traits. Use this backstory prompt as a starting point and elaborate on it: \"{inspiration}\"\n\n\
             Return a JSON object with the following structure, including 5-7 key timeline events from birth to present:\n{DETAILS_SHAPE}"
        ),
        format!(
            "This is an image of a cat named {name}. Starting with this prompt: \"{inspiration}\", create a compelling backstory that \
             fits the cat's appearance. Also determine its Myers-Briggs personality type (with both the 4-letter code and the personality \
             title), and assign Dungeons & Dragons attributes (strength, dexterity, constitution, intelligence, wisdom, charisma) on a \
             scale of 1-20.\n\nAdditionally, create a timeline of 5-7 key events in the cat's life from birth to present. Each event \
             should include the cat's age when it happened and a brief description of the event. These should align with the backstory you create."
        ),
    )
    .with_image(image)
    .json()
}

pub fn backstory(
    image: &str,
    name: &str,
    personality: Option<&PersonalityType>,
    inspiration: &str,
) -> ChatPrompt {
    let (code, title) = personality_label(personality);
    ChatPrompt::new(
        format!(
            "You are a creative writer specializing in cat storytelling. Based on the image of the cat named {name} with personality \
             type {code} ({title}), create an engaging backstory.\n\n\
             Use this backstory prompt as inspiration: \"{inspiration}\"\n\n\
             IMPORTANT: DO NOT use any markdown formatting like ### or ## in your response. Just write plain text paragraphs.\n\n\
             Write a compelling 2-3 paragraph backstory that explains the cat's personality, notable quirks, and key life events. \
             Make it evocative and detailed. The timeline will be generated separately, so focus only on creating a cohesive narrative."
        ),
        format!(
            "This is an image of {name}, a cat with personality type {code} ({title}). Please create a compelling backstory based on \
             this prompt: \"{inspiration}\"."
        ),
    )
    .with_image(image)
}

pub fn timeline(name: &str, personality: Option<&PersonalityType>, backstory: &str) -> ChatPrompt {
    let (code, _) = personality_label(personality);
    ChatPrompt::new(
        "You are an AI specifically designed to extract storyline events from a cat's backstory and create a timeline.\n\n\
         You MUST create SPECIFIC timeline events that actually appear in the provided story. \
         You MUST NOT return generic cat development milestones.\n\n\
         Your output MUST:\n\
         1. Include 5 distinct events that are EXPLICITLY mentioned or strongly implied in the backstory text\n\
         2. Assign plausible ages/dates to each event based on context clues\n\
         3. Progress logically from birth to present\n\
         4. Include specific details from the backstory with direct references to story elements\n\
         5. Highlight character-defining moments that shaped the cat's personality as described in the text\n\n\
         Your response MUST be valid JSON exactly matching this structure:\n\
         { \"timeline\": [ { \"age\": \"...\", \"description\": \"...\" }, ... ] } with exactly 5 events.",
        format!(
            "Here is the backstory for a cat named {name} (personality type: {code}):\n\n{backstory}\n\n\
             Create a timeline of 5 SPECIFIC life events from this backstory. DO NOT use generic milestones like \"Started exploring\" \
             or \"Gained independence\" unless these exact activities are explicitly mentioned.\n\n\
             Each event must include:\n1. An estimated age when it occurred\n\
             2. A detailed description referencing the actual content in the backstory\n\n\
             Your response must be properly formatted JSON."
        ),
    )
    .json()
    .with_temperature(0.2)
    .with_max_tokens(1500)
    .with_penalties(0.2, 0.5)
}
