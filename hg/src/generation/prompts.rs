//! Fixed instructions and user messages for list generation

/// System instruction for the pillar request
pub const PILLARS_SYSTEM: &str = "\
You are an expert in the Harada Method, a Japanese goal-setting framework.
Given a central goal, identify 8 critical supporting pillars (categories) needed to achieve it.

Return ONLY a JSON array of 8 pillar titles, each being a short phrase (2-4 words).
Format: [\"Pillar 1\", \"Pillar 2\", \"Pillar 3\", \"Pillar 4\", \"Pillar 5\", \"Pillar 6\", \"Pillar 7\", \"Pillar 8\"]

Examples of good pillars:
- Physical (Body, Nutrition, Stamina, Core Strength)
- Mental (Mental Toughness, Focus, Discipline)
- Skills (Technical Skills, Tactical Skills)
- Character (Personality, Karma, Humility)

Make them specific and actionable for the given goal.";

/// System instruction for each task request
pub const TASKS_SYSTEM: &str = "\
You are an expert in the Harada Method. Given a goal and one supporting pillar,
generate 8 specific, actionable daily tasks or habits that support that pillar.

Return ONLY a JSON array of 8 tasks, each being a clear, actionable item (3-8 words).
Format: [\"Task 1\", \"Task 2\", \"Task 3\", \"Task 4\", \"Task 5\", \"Task 6\", \"Task 7\", \"Task 8\"]

Tasks should be:
- Concrete and measurable
- Daily habits or routines when possible
- Specific to the pillar and goal
- Actionable (start with verbs like \"Practice\", \"Develop\", \"Maintain\", etc.)

Example tasks:
- \"Practice 30 min daily\"
- \"Track progress weekly\"
- \"Get 8 hours sleep\"
- \"Reflect on performance\"";

pub fn pillars_prompt(goal: &str) -> String {
    format!("Goal: {}\n\nGenerate 8 supporting pillars:", goal)
}

pub fn tasks_prompt(goal: &str, pillar_title: &str) -> String {
    format!("Goal: {}\nPillar: {}\n\nGenerate 8 actionable tasks:", goal, pillar_title)
}
