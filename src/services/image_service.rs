//! 图片文本服务 - 业务能力层
//!
//! 把题目文本里的 `<img>` 标签替换为图片的文字内容。每个规范化后的
//! URL 在缓存文件的生命周期内最多触发一次下载与解析，失败也会以
//! 哨兵文本落入缓存，不会跨运行反复重试。

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use regex::Regex;
use tracing::{error, info, warn};

use crate::clients::{ImageFetcher, ImageTextExtractor};
use crate::infrastructure::Storage;
use crate::models::{Options, Question};
use crate::utils::logging::tail_text;

/// 下载失败的哨兵文本，作为终态写入缓存
pub const DOWNLOAD_FAILED_SENTINEL: &str = "[图片下载失败]";
/// 解析失败的哨兵文本，作为终态写入缓存
pub const EXTRACT_FAILED_SENTINEL: &str = "[图片解析失败]";

const PARSED_CACHE_KEY: &str = "parsed.json";

/// 规范化图片引用
///
/// 协议相对引用（`//…`）补全为 https；不以 http 开头的引用视为
/// 相对路径，返回 `None`。
pub fn normalize_reference(reference: &str) -> Option<String> {
    if reference.starts_with("http") {
        Some(reference.to_string())
    } else if reference.starts_with("//") {
        Some(format!("https:{}", reference))
    } else {
        None
    }
}

/// 图片文本服务
pub struct ImageTextService {
    storage: Arc<dyn Storage>,
    fetcher: Arc<dyn ImageFetcher>,
    extractor: Arc<dyn ImageTextExtractor>,
    interval: Duration,
    img_re: Regex,
    cache: Mutex<BTreeMap<String, String>>,
}

impl ImageTextService {
    /// 创建服务并加载已有缓存
    ///
    /// # 参数
    /// - `storage`: 持久化后端，缓存写在 `parsed.json`
    /// - `fetcher`: 图片下载实现
    /// - `extractor`: 图片文本提取实现
    /// - `interval`: 每次外部解析调用后的间隔
    pub fn new(
        storage: Arc<dyn Storage>,
        fetcher: Arc<dyn ImageFetcher>,
        extractor: Arc<dyn ImageTextExtractor>,
        interval: Duration,
    ) -> Result<Self> {
        let img_re = Regex::new(r#"(?i)<img[^>]+src=["']([^"']+)["'][^>]*>"#)?;

        let cache = match storage.get(PARSED_CACHE_KEY)? {
            None => BTreeMap::new(),
            Some(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(map) => {
                    info!("已加载 {} 条图片解析缓存", map.len());
                    map
                }
                Err(e) => {
                    error!("图片解析缓存损坏，按空缓存处理: {}", e);
                    BTreeMap::new()
                }
            },
        };

        Ok(Self {
            storage,
            fetcher,
            extractor,
            interval,
            img_re,
            cache: Mutex::new(cache),
        })
    }

    /// 解析一个图片引用，返回可替换进文本的内容
    ///
    /// 非 http(s) 引用返回 `None`；其余情况总能得到文本（缓存命中、
    /// 新解析结果或失败哨兵）。
    pub async fn resolve(&self, reference: &str) -> Option<String> {
        let url = match normalize_reference(reference) {
            Some(url) => url,
            None => {
                warn!("跳过疑似相对路径的图片引用: {}", reference);
                return None;
            }
        };
        Some(self.resolve_url(&url).await)
    }

    async fn resolve_url(&self, url: &str) -> String {
        if let Some(hit) = self.cached(url) {
            info!("使用缓存的图片文本: {}", url);
            info!("[图片解析] {}: {}", tail_text(url, 10), hit);
            return hit;
        }

        info!("正在解析图片: {}", url);
        let image = match self.fetcher.fetch(url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("图片下载失败 {}: {}", url, e);
                let sentinel = DOWNLOAD_FAILED_SENTINEL.to_string();
                self.store_entry(url, &sentinel);
                return sentinel;
            }
        };

        let entry = match self.extractor.extract(&image).await {
            Ok(text) => {
                let entry = format!(" [{}] ", text.trim());
                info!("[图片解析] {}: {}", tail_text(url, 10), entry);
                entry
            }
            Err(e) => {
                error!("图片解析失败 {}: {}", url, e);
                EXTRACT_FAILED_SENTINEL.to_string()
            }
        };
        self.store_entry(url, &entry);

        // 解析调用之间保持间隔，避免触发频率限制
        tokio::time::sleep(self.interval).await;
        entry
    }

    /// 替换文本中所有可解析的图片标签
    ///
    /// 相同 URL 的多次出现只解析一次；规范化失败的引用原样保留。
    pub async fn enrich_text(&self, text: &str) -> String {
        if text.is_empty() {
            return text.to_string();
        }

        let references: Vec<String> = self
            .img_re
            .captures_iter(text)
            .map(|caps| caps[1].to_string())
            .collect();
        if references.is_empty() {
            return text.to_string();
        }

        let mut resolved: HashMap<String, String> = HashMap::new();
        for reference in &references {
            let Some(url) = normalize_reference(reference) else {
                warn!("跳过疑似相对路径的图片引用: {}", reference);
                continue;
            };
            if resolved.contains_key(&url) {
                continue;
            }
            let replacement = self.resolve_url(&url).await;
            resolved.insert(url, replacement);
        }

        self.img_re
            .replace_all(text, |caps: &regex::Captures| {
                let reference = &caps[1];
                match normalize_reference(reference).and_then(|url| resolved.get(&url).cloned()) {
                    Some(replacement) => replacement,
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    /// 替换一道题目的标题与文本形态选项中的图片标签
    ///
    /// 列表形态的选项原样跳过。
    ///
    /// # 返回
    /// 题目内容是否发生了变化。
    pub async fn enrich_question(&self, question: &mut Question) -> bool {
        let mut changed = false;

        let new_title = self.enrich_text(&question.title).await;
        if new_title != question.title {
            question.title = new_title;
            changed = true;
        }

        let text_options = match &question.options {
            Some(Options::Text(block)) => Some(block.clone()),
            _ => None,
        };
        if let Some(block) = text_options {
            let enriched = self.enrich_text(&block).await;
            if enriched != block {
                question.options = Some(Options::Text(enriched));
                changed = true;
            }
        }

        changed
    }

    fn cached(&self, url: &str) -> Option<String> {
        self.cache.lock().unwrap().get(url).cloned()
    }

    fn store_entry(&self, url: &str, entry: &str) {
        let mut cache = self.cache.lock().unwrap();
        cache.insert(url.to_string(), entry.to_string());
        // 每新增一条就整体持久化；失败只记日志，内存中的结果仍然可用
        match serde_json::to_string_pretty(&*cache) {
            Ok(json) => {
                if let Err(e) = self.storage.atomic_replace(PARSED_CACHE_KEY, &json) {
                    error!("保存图片解析缓存失败: {}", e);
                }
            }
            Err(e) => error!("序列化图片解析缓存失败: {}", e),
        }
    }
}
