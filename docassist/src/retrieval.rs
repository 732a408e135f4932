//! In-memory document store with keyword, type and amount queries.
//!
//! No embeddings: keyword search is a weighted substring count, amount search
//! reads the document's amount from its metadata. Documents keep insertion
//! order, which is also the tie-break order of every ranked query.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Map, Value};

use crate::schemas::DocumentChunk;

/// Metadata fields holding a document's amount, in priority order.
pub const AMOUNT_FIELDS: [&str; 5] = ["total", "amount", "value", "total_amount", "total_value"];

#[derive(Debug, thiserror::Error)]
pub enum RetrieverError {
    #[error("document id must not be empty")]
    EmptyId,
}

/// A stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub doc_id: String,
    pub title: String,
    pub content: String,
    /// `invoice`, `contract`, `claim`, ...
    pub doc_type: String,
    pub metadata: Map<String, Value>,
}

impl Document {
    pub fn new(
        doc_id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        doc_type: impl Into<String>,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            doc_id: doc_id.into(),
            title: title.into(),
            content: content.into(),
            doc_type: doc_type.into(),
            metadata,
        }
    }

    /// First numeric value among [`AMOUNT_FIELDS`]. Numeric strings count.
    pub fn amount(&self) -> Option<f64> {
        amount_from(&self.metadata, &AMOUNT_FIELDS)
    }

    fn to_chunk(&self, relevance_score: f64) -> DocumentChunk {
        let mut metadata = Map::new();
        metadata.insert("title".into(), Value::String(self.title.clone()));
        metadata.insert("doc_type".into(), Value::String(self.doc_type.clone()));
        for (k, v) in &self.metadata {
            metadata.insert(k.clone(), v.clone());
        }
        DocumentChunk {
            doc_id: self.doc_id.clone(),
            content: self.content.clone(),
            metadata,
            relevance_score,
        }
    }
}

/// Reads the first numeric value among `fields` of `metadata`.
pub fn amount_from(metadata: &Map<String, Value>, fields: &[&str]) -> Option<f64> {
    fields.iter().find_map(|f| match metadata.get(*f)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// `22000.0` -> `"22,000.00"`.
pub fn format_amount(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac)
}

/// Amount/count summary of the collection.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DocumentStatistics {
    pub total_documents: usize,
    pub documents_with_amounts: usize,
    pub total_amount: f64,
    /// 0 when no document has an amount.
    pub average_amount: f64,
    /// Count per type, in first-seen order.
    pub document_types: Vec<(String, usize)>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
}

fn amount_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$?(\d+(?:,\d{3})*(?:\.\d{2})?)").unwrap_or_else(|e| panic!("amount regex: {e}"))
    })
}

/// All dollar-ish amounts in `query`, in order of appearance.
pub fn extract_amounts(query: &str) -> Vec<f64> {
    amount_regex()
        .captures_iter(query)
        .filter_map(|c| c.get(1)?.as_str().replace(',', "").parse::<f64>().ok())
        .collect()
}

fn contains_any(haystack: &str, words: &[&str]) -> bool {
    words.iter().any(|w| haystack.contains(w))
}

fn sort_desc_by<F: Fn(&DocumentChunk) -> f64>(chunks: &mut [DocumentChunk], key: F) {
    chunks.sort_by(|a, b| {
        key(b)
            .partial_cmp(&key(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

fn chunk_amount(chunk: &DocumentChunk) -> f64 {
    amount_from(&chunk.metadata, &AMOUNT_FIELDS).unwrap_or(0.0)
}

/// Simulated retriever over an in-memory document list.
#[derive(Debug, Clone)]
pub struct SimulatedRetriever {
    documents: Vec<Document>,
}

impl Default for SimulatedRetriever {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedRetriever {
    /// Retriever seeded with the five sample documents.
    pub fn new() -> Self {
        Self {
            documents: sample_documents(),
        }
    }

    pub fn empty() -> Self {
        Self {
            documents: Vec::new(),
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Inserts `document`, replacing one with the same id in place.
    pub fn add_document(&mut self, document: Document) -> Result<(), RetrieverError> {
        if document.doc_id.trim().is_empty() {
            return Err(RetrieverError::EmptyId);
        }
        match self
            .documents
            .iter_mut()
            .find(|d| d.doc_id == document.doc_id)
        {
            Some(existing) => *existing = document,
            None => self.documents.push(document),
        }
        Ok(())
    }

    /// Scores every document against the whitespace-split, lowercased query:
    /// +2 per keyword in the title, +0.5 per occurrence in the content and +1
    /// per metadata value containing it. Returns the `top_k` best with score > 0.
    pub fn retrieve_by_keyword(&self, query: &str, top_k: usize) -> Vec<DocumentChunk> {
        let query = query.to_lowercase();
        let keywords: Vec<&str> = query.split_whitespace().collect();
        let mut results: Vec<DocumentChunk> = self
            .documents
            .iter()
            .filter_map(|doc| {
                let content = doc.content.to_lowercase();
                let title = doc.title.to_lowercase();
                let values: Vec<String> = doc
                    .metadata
                    .values()
                    .map(|v| match v {
                        Value::String(s) => s.to_lowercase(),
                        other => other.to_string().to_lowercase(),
                    })
                    .collect();
                let mut score = 0.0;
                for kw in &keywords {
                    if title.contains(kw) {
                        score += 2.0;
                    }
                    score += content.matches(kw).count() as f64 * 0.5;
                    score += values.iter().filter(|v| v.contains(kw)).count() as f64;
                }
                (score > 0.0).then(|| doc.to_chunk(score))
            })
            .collect();
        sort_desc_by(&mut results, |c| c.relevance_score);
        results.truncate(top_k);
        results
    }

    /// Documents whose type equals `doc_type`, ignoring case.
    pub fn retrieve_by_type(&self, doc_type: &str) -> Vec<DocumentChunk> {
        let wanted = doc_type.to_lowercase();
        self.documents
            .iter()
            .filter(|d| d.doc_type.to_lowercase() == wanted)
            .map(|d| d.to_chunk(1.0))
            .collect()
    }

    /// Inclusive amount range, largest first. With neither bound, every
    /// document that has an amount, in insertion order.
    pub fn retrieve_by_amount_range(
        &self,
        min_amount: Option<f64>,
        max_amount: Option<f64>,
    ) -> Vec<DocumentChunk> {
        if min_amount.is_none() && max_amount.is_none() {
            return self
                .documents
                .iter()
                .filter(|d| d.amount().is_some())
                .map(|d| d.to_chunk(1.0))
                .collect();
        }
        let mut results: Vec<DocumentChunk> = self
            .documents
            .iter()
            .filter(|d| match d.amount() {
                Some(a) => min_amount.map_or(true, |m| a >= m) && max_amount.map_or(true, |m| a <= m),
                None => false,
            })
            .map(|d| d.to_chunk(1.0))
            .collect();
        sort_desc_by(&mut results, chunk_amount);
        results
    }

    pub fn retrieve_by_exact_amount(&self, amount: f64, tolerance: f64) -> Vec<DocumentChunk> {
        self.documents
            .iter()
            .filter(|d| d.amount().is_some_and(|a| (a - amount).abs() <= tolerance))
            .map(|d| d.to_chunk(1.0))
            .collect()
    }

    /// Documents within ±`percentage`% of `amount`, closest first, scored
    /// `1 - distance / tolerance`. A zero tolerance is an exact match.
    pub fn retrieve_by_approximate_amount(&self, amount: f64, percentage: f64) -> Vec<DocumentChunk> {
        let tolerance = (amount * percentage / 100.0).abs();
        if tolerance == 0.0 {
            return self.retrieve_by_exact_amount(amount, 0.01);
        }
        let mut results: Vec<DocumentChunk> = self
            .documents
            .iter()
            .filter_map(|d| {
                let a = d.amount()?;
                let distance = (a - amount).abs();
                (distance <= tolerance).then(|| d.to_chunk(1.0 - distance / tolerance))
            })
            .collect();
        sort_desc_by(&mut results, |c| c.relevance_score);
        results
    }

    /// Amount search driven by an explicit comparison word, else by parsing `query`.
    ///
    /// A comparison that needs a single amount but has none falls back to parsing.
    pub fn retrieve_by_amount(
        &self,
        query: &str,
        comparison: Option<&str>,
        amount: Option<f64>,
        min_amount: Option<f64>,
        max_amount: Option<f64>,
    ) -> Vec<DocumentChunk> {
        if let Some(cmp) = comparison.map(|c| c.trim().to_lowercase()) {
            match cmp.as_str() {
                "greater" | "over" | "above" | "more than" => {
                    return self.retrieve_by_amount_range(amount, None)
                }
                "less" | "under" | "below" | "less than" => {
                    return self.retrieve_by_amount_range(None, amount)
                }
                "exact" | "exactly" | "equal" | "equals" => {
                    if let Some(a) = amount {
                        return self.retrieve_by_exact_amount(a, 0.01);
                    }
                }
                "approximate" | "around" | "about" | "roughly" => {
                    if let Some(a) = amount {
                        return self.retrieve_by_approximate_amount(a, 10.0);
                    }
                }
                "between" | "range" => return self.retrieve_by_amount_range(min_amount, max_amount),
                _ => {}
            }
        }
        self.parse_and_retrieve_by_amount(query)
    }

    /// Natural-language amount query. Only the first keyword family found is
    /// tried; if it lacks the amounts it needs, the default applies: the range
    /// `[min * 0.9, max * 1.1]` over mentioned amounts, or keyword search.
    pub fn parse_and_retrieve_by_amount(&self, query: &str) -> Vec<DocumentChunk> {
        let lower = query.to_lowercase();
        let amounts = extract_amounts(query);

        if contains_any(&lower, &["over", "above", "more than", "greater than", ">"]) {
            if let Some(a) = amounts.first() {
                return self.retrieve_by_amount_range(Some(*a), None);
            }
        } else if contains_any(&lower, &["under", "below", "less than", "<"]) {
            if let Some(a) = amounts.first() {
                return self.retrieve_by_amount_range(None, Some(*a));
            }
        } else if contains_any(&lower, &["between", "range", "from"]) {
            if let [a, b, ..] = amounts[..] {
                return self.retrieve_by_amount_range(Some(a.min(b)), Some(a.max(b)));
            }
        } else if contains_any(&lower, &["around", "about", "approximately", "roughly", "~"]) {
            if let Some(a) = amounts.first() {
                return self.retrieve_by_approximate_amount(*a, 10.0);
            }
        } else if contains_any(&lower, &["exactly", "exact", "precisely", "="]) {
            if let Some(a) = amounts.first() {
                return self.retrieve_by_exact_amount(*a, 0.01);
            }
        }

        if !amounts.is_empty() {
            let min = amounts.iter().copied().fold(f64::INFINITY, f64::min);
            let max = amounts.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            return self.retrieve_by_amount_range(Some(min * 0.9), Some(max * 1.1));
        }
        self.retrieve_by_keyword(query, 3)
    }

    pub fn get_document_by_id(&self, doc_id: &str) -> Option<DocumentChunk> {
        self.documents
            .iter()
            .find(|d| d.doc_id == doc_id)
            .map(|d| d.to_chunk(1.0))
    }

    pub fn get_statistics(&self) -> DocumentStatistics {
        let mut document_types: Vec<(String, usize)> = Vec::new();
        let mut amounts = Vec::new();
        for doc in &self.documents {
            match document_types.iter_mut().find(|(t, _)| *t == doc.doc_type) {
                Some((_, n)) => *n += 1,
                None => document_types.push((doc.doc_type.clone(), 1)),
            }
            if let Some(a) = doc.amount() {
                amounts.push(a);
            }
        }
        let total_amount: f64 = amounts.iter().sum();
        DocumentStatistics {
            total_documents: self.documents.len(),
            documents_with_amounts: amounts.len(),
            total_amount,
            average_amount: if amounts.is_empty() {
                0.0
            } else {
                total_amount / amounts.len() as f64
            },
            document_types,
            min_amount: amounts.iter().copied().reduce(f64::min),
            max_amount: amounts.iter().copied().reduce(f64::max),
        }
    }
}

fn meta(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn sample_documents() -> Vec<Document> {
    vec![
        Document::new(
            "INV-001",
            "Invoice #12345",
            "Invoice #12345
Date: 2024-01-15
Client: Acme Corporation

Services Rendered:
- Consulting Services: $5,000
- Software Development: $12,500
- Support & Maintenance: $2,500

Subtotal: $20,000
Tax (10%): $2,000
Total Due: $22,000

Payment Terms: Net 30 days",
            "invoice",
            meta(json!({"total": 22000, "client": "Acme Corporation", "date": "2024-01-15"})),
        ),
        Document::new(
            "CON-001",
            "Service Agreement",
            "SERVICE AGREEMENT

This Service Agreement is entered into on January 1, 2024, between:
- Provider: DocDacity Solutions Inc.
- Client: Healthcare Partners LLC

Services:
1. Document Processing Platform Access
2. 24/7 Technical Support
3. Monthly Data Analytics Reports
4. Compliance Monitoring

Duration: 12 months
Monthly Fee: $15,000
Total Contract Value: $180,000

Termination: Either party may terminate with 60 days written notice.",
            "contract",
            meta(json!({"value": 180000, "duration_months": 12, "client": "Healthcare Partners LLC"})),
        ),
        Document::new(
            "CLM-001",
            "Insurance Claim #78901",
            "INSURANCE CLAIM FORM
Claim Number: 78901
Date of Incident: 2024-02-10
Policy Number: POL-456789

Claimant: John Doe
Type of Claim: Medical Expense Reimbursement

Expenses:
- Hospital Visit: $1,200
- Diagnostic Tests: $800
- Medication: $150
- Follow-up Consultation: $300

Total Claim Amount: $2,450

Status: Under Review",
            "claim",
            meta(json!({"amount": 2450, "status": "Under Review", "claimant": "John Doe"})),
        ),
        Document::new(
            "INV-002",
            "Invoice #12346",
            "Invoice #12346
Date: 2024-02-20
Client: TechStart Inc.

Products:
- Enterprise License (Annual): $50,000
- Implementation Services: $15,000
- Training Package: $5,000

Subtotal: $70,000
Discount (10%): -$7,000
Tax (10%): $6,300
Total Due: $69,300

Payment Terms: Net 45 days",
            "invoice",
            meta(json!({"total": 69300, "client": "TechStart Inc.", "date": "2024-02-20"})),
        ),
        Document::new(
            "INV-003",
            "Invoice #12347",
            "Invoice #12347
Date: 2024-03-01
Client: Global Corp

Services:
- Annual Subscription: $120,000
- Premium Support: $30,000
- Custom Development: $45,000

Subtotal: $195,000
Tax (10%): $19,500
Total Due: $214,500

Payment Terms: Net 60 days",
            "invoice",
            meta(json!({"total": 214500, "client": "Global Corp", "date": "2024-03-01"})),
        ),
    ]
}
