//! Shared fixtures: deterministic model doubles and in-test PDF builders.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chatrag::config::Config;
use chatrag::controller::RagController;
use chatrag::embedding::EmbeddingProvider;
use chatrag::factory::ModelFactory;
use chatrag::llm::{ChatModel, PromptMessage};

const DIMS: usize = 32;

/// Hashes lowercase words into a fixed-size bag-of-words vector.
#[derive(Default)]
pub struct HashEmbedder {
    pub calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    fn model_name(&self) -> &str {
        "hash-bow"
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| bag_of_words(t)).collect())
    }
}

fn bag_of_words(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; DIMS];
    for word in text.split_whitespace() {
        let word = word.to_lowercase();
        let bucket = word.bytes().fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
        v[bucket % DIMS] += 1.0;
    }
    v
}

/// An embedder whose service is always down.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    fn model_name(&self) -> &str {
        "failing"
    }

    async fn embed_texts(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        anyhow::bail!("embedding service down")
    }
}

/// Records every prompt and answers with a fixed prefix plus the context.
#[derive(Default)]
pub struct ScriptedModel {
    pub prompts: Mutex<Vec<Vec<PromptMessage>>>,
}

impl ScriptedModel {
    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, messages: &[PromptMessage]) -> Result<String> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        let system = messages.first().map(|m| m.content.as_str()).unwrap_or("");
        let context = system
            .split("Document context:\n")
            .nth(1)
            .unwrap_or("")
            .trim();
        Ok(format!("The document says: {}", context))
    }
}

/// A chat model that always fails.
pub struct BrokenModel;

#[async_trait]
impl ChatModel for BrokenModel {
    fn model_name(&self) -> &str {
        "broken"
    }

    async fn complete(&self, _messages: &[PromptMessage]) -> Result<String> {
        anyhow::bail!("upstream model unavailable")
    }
}

pub struct Harness {
    pub controller: RagController,
    pub model: Arc<ScriptedModel>,
    pub embedder: Arc<HashEmbedder>,
}

pub fn harness() -> Harness {
    let model = Arc::new(ScriptedModel::default());
    let embedder = Arc::new(HashEmbedder::default());
    let factory = ModelFactory::from_parts(model.clone(), embedder.clone());
    let controller = RagController::new(&factory, &Config::default()).unwrap();
    Harness {
        controller,
        model,
        embedder,
    }
}

/// Builds a PDF with one page per entry, each page showing its text in Helvetica.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// Three pages of "Hello world" repeated.
pub fn hello_world_pdf() -> Vec<u8> {
    let line = "Hello world Hello world Hello world";
    pdf_with_pages(&[line, line, line])
}
