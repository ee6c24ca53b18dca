//! Built-in task presets.
//!
//! These cover the standard experiment conditions so the binary runs without
//! a config file. A task of the same key in `_config/config.yaml` replaces
//! the preset entirely.

use super::config::{Framing, ItemSpec, StartGate, TaskConfig, TaskKind};
use super::messages::{Language, MessageOverrides};
use crate::detection::{CompletionPolicy, Item};

pub const BUILTIN_KEYS: &[&str] = &[
    "island-ranking-social",
    "island-ranking-task",
    "crisis-statement",
    "brainstorm",
    "desert-assistant",
    "desert-partner",
    "candidate-shortlist",
];

/// Ten items salvaged after a plane ditches near a desert island.
const ISLAND_ITEMS: &[(&str, &[&str])] = &[
    ("打火机", &["打火机"]),
    ("压缩饼干", &["压缩饼干", "饼干"]),
    ("淡水", &["淡水", "水"]),
    ("信号镜", &["信号镜", "镜子"]),
    ("鲨鱼驱赶剂", &["鲨鱼驱赶剂", "驱鲨剂", "驱鲨"]),
    ("尼龙绳", &["尼龙绳", "绳子", "绳"]),
    ("塑料布", &["塑料布", "塑胶布", "塑料薄膜"]),
    ("匕首", &["匕首", "小刀", "刀"]),
    ("急救包", &["急救包", "医药包", "医疗包"]),
    ("渔网", &["渔网", "捕鱼网", "网"]),
];

const DESERT_ITEMS: &[(&str, &str)] = &[
    ("a bottle of water", "water"),
    ("a 20′×20′ piece of canvas", "canvas"),
    ("a map", "map"),
    ("a knife", "knife"),
    ("a magnetic compass", "compass"),
];

const DESERT_EXPERT_RANK: &[&str] = &[
    "a bottle of water",
    "a 20′×20′ piece of canvas",
    "a magnetic compass",
    "a map",
    "a knife",
];

const BRAINSTORM_POLICY: &str = "Keep every assistant reply concise. Aim for about 80–100 words. \
Only go longer if the user explicitly requests more detail. Avoid repetition; prioritize clarity and substance.";

/// Island survival items as a detector table.
pub fn island_survival_items() -> Vec<Item> {
    ISLAND_ITEMS
        .iter()
        .map(|(id, aliases)| Item::new(*id, aliases))
        .collect()
}

fn island_item_specs() -> Vec<ItemSpec> {
    ISLAND_ITEMS
        .iter()
        .map(|(id, aliases)| ItemSpec {
            id: id.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            replies: Vec::new(),
        })
        .collect()
}

fn desert_item_specs(with_replies: bool) -> Vec<ItemSpec> {
    DESERT_ITEMS
        .iter()
        .map(|(id, alias)| ItemSpec {
            id: id.to_string(),
            aliases: vec![alias.to_string()],
            replies: if with_replies {
                partner_replies(id)
            } else {
                Vec::new()
            },
        })
        .collect()
}

fn partner_replies(id: &str) -> Vec<String> {
    let replies: &[&str] = match id {
        "a bottle of water" => &[
            "Easy call. Water is what keeps anyone going longest out here.",
            "Essential, sure, but one bottle is limited. Does it tempt us to walk farther than we should?",
            "Besides staying hydrated, what else makes it your pick? I'd like to follow your reasoning.",
        ],
        "a 20′×20′ piece of canvas" => &[
            "Agreed, the canvas matters. Shade by day, maybe dew at night, and it's big enough to signal with.",
            "Isn't it bulky to carry though? It won't find us water or tell us where we are.",
            "Interesting choice. What makes the canvas stand out for you?",
        ],
        "a map" => &[
            "I'm with you. If we can place the crash site, the map could lead us to water or a road.",
            "Without landmarks we recognise, a map is just paper. Are we sure we can read it here?",
            "Tell me more: how would you use the map to plan our next move?",
        ],
        "a knife" => &[
            "Good pick. A knife helps with shelter, cutting and plenty of small jobs.",
            "Useful, but it won't get us water or rescue on its own. Is it really that high?",
            "How do you see the knife helping us survive?",
        ],
        "a magnetic compass" => &[
            "Nice. With a compass we can hold a heading instead of walking in circles.",
            "Only if we know where to go. Otherwise it can point us the wrong way just as easily.",
            "What role do you see the compass playing for us?",
        ],
        _ => &[],
    };
    replies.iter().map(|r| r.to_string()).collect()
}

fn desert_item_list() -> String {
    DESERT_ITEMS
        .iter()
        .map(|(id, _)| format!("• {id}  \n"))
        .collect()
}

/// A preset by key.
pub fn builtin(key: &str) -> Option<TaskConfig> {
    let config = match key {
        "island-ranking-social" => island_ranking(
            "flight-social",
            Framing::Social,
            "你是参与者的伙伴，和他一起讨论荒岛求生物品的重要性排序。语气亲切自然，多倾听，少下结论。",
        ),
        "island-ranking-task" => island_ranking(
            "flight-task",
            Framing::Task,
            "你是任务助手，帮助参与者完成荒岛求生物品的重要性排序。回答简洁，聚焦任务本身。",
        ),
        "crisis-statement" => TaskConfig {
            bot_name: "crisis-social".into(),
            framing: Framing::Social,
            language: Language::Zh,
            kind: TaskKind::OpenEnded,
            start: StartGate::Immediate,
            opening: None,
            time_budget_secs: Some(7 * 60),
            system_prompts: vec![
                "你正在和参与者一起为一起企业危机事件起草对外声明。给出具体建议，并回应参与者的想法。".into(),
            ],
            greeting: Some("你好！我们一起来起草这份危机声明吧。你想先从哪里入手？".into()),
            response_policy: None,
            temperature: None,
            max_tokens: None,
            messages: MessageOverrides::default(),
        },
        "brainstorm" => TaskConfig {
            bot_name: "brainstorm-assistant".into(),
            framing: Framing::Assistant,
            language: Language::En,
            kind: TaskKind::OpenEnded,
            start: StartGate::Immediate,
            opening: None,
            time_budget_secs: None,
            system_prompts: vec![
                "You are helping the participant brainstorm ideas. Build on their suggestions and offer new angles.".into(),
            ],
            greeting: Some("Hi! I'm your assistant for this brainstorming session. What should we start with?".into()),
            response_policy: Some(BRAINSTORM_POLICY.into()),
            temperature: None,
            max_tokens: None,
            messages: MessageOverrides::default(),
        },
        "desert-assistant" => TaskConfig {
            bot_name: "desert-assistant".into(),
            framing: Framing::Assistant,
            language: Language::En,
            kind: TaskKind::Stepwise {
                items: desert_item_specs(false),
                step_prompts: vec![
                    "Let's start with the most immediate needs for surviving in the desert.".into(),
                    "Nice choice, that one is crucial.  \n\nNext, which item would best help you move toward safety?".into(),
                    "Smart move, it really helps out here.  \nTime to choose the next one. I'm right here with you!".into(),
                    "I'm on board with that.  \nTwo items to go. Which one helps us most?".into(),
                    "Great choice!  \nOnly one item is left to rank. Confirm your final selection when you're ready.".into(),
                ],
                expert_rank: DESERT_EXPERT_RANK.iter().map(|s| s.to_string()).collect(),
            },
            start: StartGate::AnyInput,
            opening: Some(format!(
                "As your assistant, I'll help you rank these five items by how much they improve your chances of survival:  \n{}Take a moment to think it over, then begin!",
                desert_item_list()
            )),
            time_budget_secs: None,
            system_prompts: Vec::new(),
            greeting: Some(
                "**Hello! I'm your assistant for today's task.**  \nI'm here to support you the way you prefer. Just tell me what you need.".into(),
            ),
            response_policy: None,
            temperature: None,
            max_tokens: None,
            messages: MessageOverrides {
                closing: Some(
                    "Well done! You've ranked all five items.  \nIt's been a pleasure being your assistant today!".into(),
                ),
                ..Default::default()
            },
        },
        "desert-partner" => TaskConfig {
            bot_name: "desert-partner".into(),
            framing: Framing::Partner,
            language: Language::En,
            kind: TaskKind::Stepwise {
                items: desert_item_specs(true),
                step_prompts: Vec::new(),
                expert_rank: DESERT_EXPERT_RANK.iter().map(|s| s.to_string()).collect(),
            },
            start: StartGate::Keyword {
                keyword: "ok".into(),
            },
            opening: Some(
                "Let's start with the most immediate needs for surviving in the desert.".into(),
            ),
            time_budget_secs: None,
            system_prompts: Vec::new(),
            greeting: Some(format!(
                "**Hello! I'm your partner for today's task.**  \nLet's rank these five items together. I may challenge your ideas now and then.  \n{}Say **\"OK\"** when you're ready to begin!",
                desert_item_list()
            )),
            response_policy: None,
            temperature: None,
            max_tokens: None,
            messages: MessageOverrides {
                closing: Some(
                    "Well done! You've ranked all five items.  \nIt's been a pleasure working with you.".into(),
                ),
                ..Default::default()
            },
        },
        "candidate-shortlist" => TaskConfig {
            bot_name: "hr-assistant".into(),
            framing: Framing::Assistant,
            language: Language::Zh,
            kind: TaskKind::Shortlist {
                first: 'A',
                last: 'G',
                picks: 2,
                strong_intent: None,
                weak_intent: None,
                question_markers: None,
            },
            start: StartGate::Immediate,
            opening: None,
            time_budget_secs: None,
            system_prompts: vec![
                "你是 HR 助手，协助参与者从候选人 A–G 中选出两位进入最终面试。只提供分析，由参与者做最终决定。".into(),
            ],
            greeting: Some("你好！我们一起看看 A–G 七位候选人，最终选出两位进入最终面试。".into()),
            response_policy: None,
            temperature: None,
            max_tokens: None,
            messages: MessageOverrides::default(),
        },
        _ => return None,
    };
    Some(config)
}

fn island_ranking(bot_name: &str, framing: Framing, prompt: &str) -> TaskConfig {
    TaskConfig {
        bot_name: bot_name.into(),
        framing,
        language: Language::Zh,
        kind: TaskKind::Ranking {
            items: island_item_specs(),
            policy: CompletionPolicy::NumberedOrUnordered,
            expert_rank: Vec::new(),
        },
        start: StartGate::Immediate,
        opening: None,
        time_budget_secs: Some(5 * 60),
        system_prompts: vec![prompt.into()],
        greeting: Some(
            "你好！我们的飞机在荒岛附近迫降，手边有十件物品。一起讨论它们的重要性，最后请给出 1–10 的完整排序。".into(),
        ),
        response_policy: None,
        temperature: None,
        max_tokens: None,
        messages: MessageOverrides::default(),
    }
}
