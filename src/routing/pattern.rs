/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Wildcard classification and the canonical concrete-topic identity key.

use crate::error::BusError;
use crate::topic::{Token, Topic};

/// A fully concrete token, usable as a trie map key. Literal wrappers are
/// unwrapped before this point, so `Literal("+")` and a plain `"+"` published
/// as data both project to the same atom.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub(crate) enum Atom {
    Str(String),
    Int(i64),
}

/// One classified position of a subscription pattern or retained query.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Segment {
    Atom(Atom),
    Single,
    Multi,
}

/// The bus's wildcard symbol configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Wildcards {
    pub(crate) single: String,
    pub(crate) multi: String,
}

impl Wildcards {
    fn classify(&self, token: &Token) -> Segment {
        match token {
            Token::Literal(raw) => Segment::Atom(Atom::Str(raw.clone())),
            Token::Int(value) => Segment::Atom(Atom::Int(*value)),
            Token::Str(value) if *value == self.single => Segment::Single,
            Token::Str(value) if *value == self.multi => Segment::Multi,
            Token::Str(value) => Segment::Atom(Atom::Str(value.clone())),
        }
    }

    /// Classifies a subscription pattern or retained query. The multi-level
    /// wildcard may only occupy the final position.
    pub(crate) fn compile_pattern(&self, pattern: &Topic) -> Result<Vec<Segment>, BusError> {
        let tokens = pattern.tokens();
        let mut segments = Vec::with_capacity(tokens.len());
        for (index, token) in tokens.iter().enumerate() {
            let segment = self.classify(token);
            if segment == Segment::Multi && index + 1 != tokens.len() {
                return Err(BusError::InvalidTopic(
                    "multi-level wildcard must be the last token",
                ));
            }
            segments.push(segment);
        }
        Ok(segments)
    }

    /// Projects a published topic to atoms. Publication topics are data, so
    /// tokens equal to a wildcard symbol are kept as ordinary values.
    pub(crate) fn literal_atoms(&self, topic: &Topic) -> Vec<Atom> {
        topic
            .tokens()
            .iter()
            .map(|token| match token {
                Token::Str(value) | Token::Literal(value) => Atom::Str(value.clone()),
                Token::Int(value) => Atom::Int(*value),
            })
            .collect()
    }

    /// Projects a topic that must be concrete (retain keys, endpoint
    /// addresses). Unwrapped wildcard symbols are rejected; literal wrappers
    /// pass through.
    pub(crate) fn concrete_atoms(&self, topic: &Topic) -> Result<Vec<Atom>, BusError> {
        topic
            .tokens()
            .iter()
            .map(|token| match self.classify(token) {
                Segment::Atom(atom) => Ok(atom),
                Segment::Single | Segment::Multi => Err(BusError::InvalidTopic(
                    "wildcard token in a topic that must be concrete",
                )),
            })
            .collect()
    }
}

/// Stable identity key for a concrete topic, used by the endpoint index.
///
/// The encoding is a per-token type tag plus length-prefixed raw bytes, so
/// the string `"1"` and the integer `1` never collide and no separator can
/// be forged by token content.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub(crate) struct TopicKey(Vec<u8>);

impl TopicKey {
    pub(crate) fn from_atoms(atoms: &[Atom]) -> Self {
        let mut encoded = Vec::new();
        for atom in atoms {
            match atom {
                Atom::Str(value) => {
                    encoded.push(b's');
                    encoded.extend_from_slice(&(value.len() as u32).to_be_bytes());
                    encoded.extend_from_slice(value.as_bytes());
                }
                Atom::Int(value) => {
                    encoded.push(b'i');
                    encoded.extend_from_slice(&8u32.to_be_bytes());
                    encoded.extend_from_slice(&value.to_be_bytes());
                }
            }
        }
        TopicKey(encoded)
    }
}
