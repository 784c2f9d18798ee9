use std::sync::Arc;
use std::time::Duration;

use question_solve_transfer::services::{AnswerStore, MatchingService, QuestionStore};
use question_solve_transfer::utils::logging;
use question_solve_transfer::{
    Answer, AnswerSheet, App, Config, FileStorage, Options, Question, QuestionSet, QuestionType,
    Storage,
};

fn question(id: &str, title: &str, options: Option<Options>, qt: QuestionType) -> Question {
    Question {
        id: Some(id.to_string()),
        title: title.to_string(),
        options,
        question_type: qt,
    }
}

fn text_options(block: &str) -> Option<Options> {
    Some(Options::Text(block.to_string()))
}

fn list_options(items: &[&str]) -> Option<Options> {
    Some(Options::List(items.iter().map(|s| s.to_string()).collect()))
}

fn answer(id: &str, text: &str, qt: QuestionType) -> Answer {
    Answer {
        id: id.to_string(),
        answer: text.to_string(),
        question_type: qt,
    }
}

/// 构造一套模板课程：四道已解出的题，其中一道带图片解析结果
fn template_questions() -> Vec<Question> {
    vec![
        question(
            "101",
            "<p>下列哪个是法国的首都？</p>",
            text_options("A. 巴黎\nB. 伦敦"),
            QuestionType::Single,
        ),
        question(
            "102",
            "世界上最大的海洋是？",
            list_options(&["A. 大西洋", "B. 太平洋", "C. 印度洋"]),
            QuestionType::Single,
        ),
        question("103", "1+1=？", None, QuestionType::Completion),
        question(
            "104",
            "下列哪些属于编程语言？",
            text_options("A. Rust\nB. HTML\nC. Python\nD. CSS"),
            QuestionType::Multiple,
        ),
    ]
}

/// 目标课程：同一套题，选项顺序打乱，外加一道模板里没有的新题
fn target_questions() -> Vec<Question> {
    vec![
        question(
            "9101",
            "下列哪个是法国的首都？",
            text_options("A. 伦敦\nB. 巴黎"),
            QuestionType::Single,
        ),
        question(
            "9102",
            "世界上最大的海洋是？",
            list_options(&["A. 印度洋", "B. 大西洋", "C. 太平洋"]),
            QuestionType::Single,
        ),
        question("9103", "1+1=？", None, QuestionType::Completion),
        question(
            "9104",
            "下列哪些属于编程语言？",
            text_options("A. HTML\nB. Rust\nC. CSS\nD. Python"),
            QuestionType::Multiple,
        ),
        question("9105", "模板里没有的新题", None, QuestionType::Completion),
    ]
}

fn seed_data(storage: Arc<dyn Storage>) {
    let questions = QuestionStore::new(storage.clone());
    let answers = AnswerStore::new(storage, Duration::ZERO);

    let tpl = template_questions();
    questions
        .upsert("sets/2001", &tpl)
        .expect("写入模板题目失败");
    questions
        .save_plain(
            "sets/2001",
            &QuestionSet {
                finished: true,
                questions: vec![question(
                    "101",
                    "下列哪个是法国的首都？",
                    text_options("A. 巴黎 [法国国旗照片]\nB. 伦敦"),
                    QuestionType::Single,
                )],
            },
        )
        .expect("写入模板解析文件失败");
    answers
        .save(
            "sets/2001",
            &[
                answer("101", "A", QuestionType::Single),
                answer("102", "B", QuestionType::Single),
                answer("103", "2", QuestionType::Completion),
                answer("104", "AC", QuestionType::Multiple),
            ],
            &tpl,
        )
        .expect("写入模板答案失败");

    questions
        .upsert("2001", &target_questions())
        .expect("写入目标题目失败");
}

#[test]
fn test_match_transfer_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(dir.path()));
    seed_data(storage.clone());

    let questions = Arc::new(QuestionStore::new(storage.clone()));
    let answers = Arc::new(AnswerStore::new(storage.clone(), Duration::ZERO));
    let matcher = MatchingService::new(questions.clone(), answers.clone()).unwrap();

    let stats = matcher.process_course("2001").expect("匹配失败");
    assert_eq!(stats.matched, 4);
    assert_eq!(stats.total, 5);

    // 答案按目标选项顺序换算，新题没有答案，completed 为 false
    let sheet = answers.load("2001").unwrap();
    assert!(!sheet.completed);
    let pairs: Vec<(&str, &str)> = sheet
        .answers
        .iter()
        .map(|a| (a.id.as_str(), a.answer.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![("9101", "B"), ("9102", "C"), ("9103", "2"), ("9104", "BD")]
    );

    // 解析文件覆盖全部五道目标题，标签按目标位置重打
    let plain = questions.load_plain("2001").unwrap();
    assert!(plain.finished);
    assert_eq!(plain.questions.len(), 5);
    assert_eq!(plain.questions[0].id.as_deref(), Some("9101"));
    assert_eq!(
        plain.questions[0].option_lines(),
        vec!["A. 伦敦", "B. 巴黎 [法国国旗照片]"]
    );
    assert_eq!(plain.questions[4].title, "模板里没有的新题");

    // 落盘产物位于约定的目录布局下
    let raw = std::fs::read_to_string(dir.path().join("2001").join("answers.json")).unwrap();
    let parsed = AnswerSheet::parse(&raw).expect("答案文件应可解析");
    assert_eq!(parsed.answers.len(), 4);
}

#[tokio::test]
async fn test_pipeline_matches_without_llm_key() {
    let dir = tempfile::tempdir().unwrap();
    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(dir.path()));
    seed_data(storage);

    // 不配置密钥：解析、解题停用，只走匹配阶段
    let config = Config {
        data_dir: dir.path().to_str().unwrap().to_string(),
        llm_api_key: String::new(),
        ..Config::default()
    };

    App::initialize(config)
        .await
        .expect("初始化失败")
        .run()
        .await
        .expect("流水线运行失败");

    let raw = std::fs::read_to_string(dir.path().join("2001").join("answers.json")).unwrap();
    let sheet = AnswerSheet::parse(&raw).expect("答案文件应可解析");
    assert_eq!(sheet.answers.len(), 4);
    assert_eq!(sheet.answers[0].answer, "B");

    let raw =
        std::fs::read_to_string(dir.path().join("2001").join("plain_questions.json")).unwrap();
    let plain: QuestionSet = serde_json::from_str(&raw).unwrap();
    assert!(plain.finished);
    assert_eq!(plain.questions.len(), 5);
}

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_full_pipeline_with_live_llm() {
    // 初始化日志
    logging::init();

    // 加载配置（需要设置 LLM_API_KEY，必要时设置 DATA_DIR）
    let config = Config::from_env();
    assert!(!config.llm_api_key.is_empty(), "需要配置 LLM_API_KEY");

    App::initialize(config)
        .await
        .expect("初始化失败")
        .run()
        .await
        .expect("流水线运行失败");
}
