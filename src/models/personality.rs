//! MBTI 人格类型表

/// 单个人格类型定义
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MbtiType {
    pub code: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

const fn mbti(code: &'static str, title: &'static str, description: &'static str) -> MbtiType {
    MbtiType {
        code,
        title,
        description,
    }
}

/// 十六种人格类型
pub const MBTI_TYPES: [MbtiType; 16] = [
    mbti("INFJ", "The Advocate", "Quiet, mystical, and insightful. INFJs are thoughtful, idealistic, and deeply committed to their values and those they care about."),
    mbti("INFP", "The Mediator", "Imaginative, open-minded, and caring. INFPs are creative idealists who seek inner harmony and meaningful connections."),
    mbti("INTJ", "The Architect", "Independent, innovative, and strategic. INTJs are analytical problem-solvers who value knowledge and competence."),
    mbti("INTP", "The Logician", "Inventive, curious, and theoretical. INTPs are logical thinkers who enjoy exploring ideas and solving complex problems."),
    mbti("ISFJ", "The Defender", "Warm, considerate, and dedicated. ISFJs are practical helpers who are committed to meeting others' needs with care."),
    mbti("ISFP", "The Adventurer", "Gentle, artistic, and sensitive. ISFPs are spontaneous creators who live in the moment and value personal freedom."),
    mbti("ISTJ", "The Logistician", "Reliable, precise, and organized. ISTJs are practical planners who value tradition, order, and follow-through."),
    mbti("ISTP", "The Virtuoso", "Adaptable, observant, and practical. ISTPs are skilled troubleshooters who enjoy exploring how things work."),
    mbti("ENFJ", "The Protagonist", "Charismatic, inspiring, and empathetic. ENFJs are natural leaders who help others fulfill their potential."),
    mbti("ENFP", "The Campaigner", "Enthusiastic, creative, and sociable. ENFPs are energetic idea-generators who see possibilities everywhere."),
    mbti("ENTJ", "The Commander", "Decisive, strategic, and assertive. ENTJs are natural leaders who organize people and resources to achieve goals."),
    mbti("ENTP", "The Debater", "Quick, clever, and argumentative. ENTPs are intellectual explorers who enjoy challenging assumptions."),
    mbti("ESFJ", "The Consul", "Warm, social, and supportive. ESFJs are attentive caregivers who value harmony and create welcoming environments."),
    mbti("ESFP", "The Entertainer", "Spontaneous, energetic, and playful. ESFPs are vivacious performers who enjoy making life fun for others."),
    mbti("ESTJ", "The Executive", "Efficient, organized, and direct. ESTJs are practical implementers who value order and work to establish stability."),
    mbti("ESTP", "The Entrepreneur", "Energetic, action-oriented, and perceptive. ESTPs are risk-takers who love excitement and solving immediate problems."),
];

/// 按代码查找（大小写不敏感）
pub fn lookup_personality(code: &str) -> Option<&'static MbtiType> {
    let code = code.trim();
    MBTI_TYPES
        .iter()
        .find(|t| t.code.eq_ignore_ascii_case(code))
}
