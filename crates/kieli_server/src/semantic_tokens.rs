//! Semantic token encoding.
//!
//! The parser records lexical classes while parsing and the resolver
//! refines identifiers once it knows what they name; the refinement is
//! recorded later, so for duplicate ranges the later record wins here.

use crate::line_index::LineIndex;
use kieli_compiler::db::{Database, DocumentId};
use kieli_compiler::lsp::SemanticTokenType as Kind;
use tower_lsp::lsp_types::{SemanticToken, SemanticTokenType, SemanticTokensLegend};

/// Token classes registered with the client, in legend order.
pub const TOKEN_TYPES: &[SemanticTokenType] = &[
    SemanticTokenType::COMMENT,        // 0
    SemanticTokenType::ENUM_MEMBER,    // 1
    SemanticTokenType::ENUM,           // 2
    SemanticTokenType::FUNCTION,       // 3
    SemanticTokenType::INTERFACE,      // 4
    SemanticTokenType::KEYWORD,        // 5
    SemanticTokenType::NAMESPACE,      // 6
    SemanticTokenType::NUMBER,         // 7
    SemanticTokenType::OPERATOR,       // 8
    SemanticTokenType::PARAMETER,      // 9
    SemanticTokenType::PROPERTY,       // 10
    SemanticTokenType::STRING,         // 11
    SemanticTokenType::STRUCT,         // 12
    SemanticTokenType::TYPE,           // 13
    SemanticTokenType::TYPE_PARAMETER, // 14
    SemanticTokenType::VARIABLE,       // 15
];

pub fn legend() -> SemanticTokensLegend {
    SemanticTokensLegend {
        token_types: TOKEN_TYPES.to_vec(),
        token_modifiers: Vec::new(),
    }
}

fn type_index(kind: Kind) -> u32 {
    match kind {
        Kind::Comment => 0,
        Kind::Constructor => 1,
        Kind::Enumeration => 2,
        Kind::Function => 3,
        Kind::Interface => 4,
        Kind::Keyword => 5,
        Kind::Module => 6,
        Kind::Number => 7,
        Kind::Operator => 8,
        Kind::Parameter => 9,
        Kind::Property => 10,
        Kind::String => 11,
        Kind::Structure => 12,
        Kind::Type => 13,
        Kind::TypeParameter => 14,
        Kind::Variable => 15,
    }
}

/// Delta-encode the document's recorded semantic tokens.
pub fn encode_tokens(db: &Database, doc_id: DocumentId, index: &LineIndex) -> Vec<SemanticToken> {
    let recorded = &db.documents[doc_id].info.semantic_tokens;

    // Stable sort by range keeps recording order within a range; the
    // resolver's refinement of a token comes later, so keep the last.
    let mut sorted: Vec<(usize, &kieli_compiler::lsp::SemanticToken)> =
        recorded.iter().enumerate().collect();
    sorted.sort_by_key(|(order, token)| (token.range.start, token.range.stop, *order));
    let mut deduped: Vec<&kieli_compiler::lsp::SemanticToken> = Vec::with_capacity(sorted.len());
    for (_, token) in sorted {
        match deduped.last() {
            Some(previous) if previous.range == token.range => {
                let last = deduped.len() - 1;
                deduped[last] = token;
            }
            _ => deduped.push(token),
        }
    }

    let mut result = Vec::with_capacity(deduped.len());
    let mut previous_line = 0u32;
    let mut previous_start = 0u32;
    for token in deduped {
        let start = index.to_lsp(token.range.start);
        let stop = index.to_lsp(token.range.stop);
        if stop.line != start.line || stop.character <= start.character {
            continue;
        }
        let delta_line = start.line - previous_line;
        let delta_start = if delta_line == 0 {
            start.character - previous_start
        } else {
            start.character
        };
        result.push(SemanticToken {
            delta_line,
            delta_start,
            length: stop.character - start.character,
            token_type: type_index(token.kind),
            token_modifiers_bitset: 0,
        });
        previous_line = start.line;
        previous_start = start.character;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use kieli_compiler::db::{self, Configuration};

    #[test]
    fn tokens_are_delta_encoded_in_order() {
        let mut database = db::database(Configuration::full());
        let source = "fn f(x: I32): I32 = x";
        let doc_id = db::test_document(&mut database, source.to_string());
        kieli_resolve::analyze_document(&mut database, doc_id);
        let index = LineIndex::new(source);

        let tokens = encode_tokens(&database, doc_id, &index);
        assert!(!tokens.is_empty());
        // The first token is the `fn` keyword at the line start.
        assert_eq!(tokens[0].delta_line, 0);
        assert_eq!(tokens[0].delta_start, 0);
        assert_eq!(tokens[0].length, 2);
        assert_eq!(tokens[0].token_type, 5);
        // Every subsequent delta stays on line zero.
        for token in &tokens[1..] {
            assert_eq!(token.delta_line, 0);
            assert!(token.delta_start > 0);
        }
    }

    #[test]
    fn duplicate_ranges_keep_the_refined_class() {
        let mut database = db::database(Configuration::full());
        let source = "fn f(): I32 = 5\nfn g(): I32 = f()";
        let doc_id = db::test_document(&mut database, source.to_string());
        kieli_resolve::analyze_document(&mut database, doc_id);
        let index = LineIndex::new(source);

        let tokens = encode_tokens(&database, doc_id, &index);
        // Exactly one token covers the call to `f` on line 1 at column
        // 14, classified as a function.
        let mut line = 0u32;
        let mut column = 0u32;
        let mut at_call: Vec<u32> = Vec::new();
        for token in &tokens {
            if token.delta_line > 0 {
                line += token.delta_line;
                column = token.delta_start;
            } else {
                column += token.delta_start;
            }
            if line == 1 && column == 14 {
                at_call.push(token.token_type);
            }
        }
        assert_eq!(at_call, vec![3]);
    }
}
