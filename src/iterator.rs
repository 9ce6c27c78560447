/*
  Copyright 2017 Takashi Ogura

  Licensed under the Apache License, Version 2.0 (the "License");
  you may not use this file except in compliance with the License.
  You may obtain a copy of the License at

      http://www.apache.org/licenses/LICENSE-2.0

  Unless required by applicable law or agreed to in writing, software
  distributed under the License is distributed on an "AS IS" BASIS,
  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
  See the License for the specific language governing permissions and
  limitations under the License.
*/
//! Iterators to iterate descendants and ancestors inside a link arena
use nalgebra::RealField;

use crate::link::{Link, LinkId};

#[derive(Debug)]
/// Iterator for parents, it contains the start link itself
pub struct Ancestors<'a, T: RealField, P> {
    links: &'a [Link<T, P>],
    next: Option<LinkId>,
}

impl<'a, T: RealField, P> Ancestors<'a, T, P> {
    pub fn new(links: &'a [Link<T, P>], start: Option<LinkId>) -> Self {
        Self { links, next: start }
    }
}

impl<'a, T: RealField, P> Iterator for Ancestors<'a, T, P> {
    type Item = LinkId;

    fn next(&mut self) -> Option<LinkId> {
        let current = self.next?;
        self.next = self.links.get(current.0).and_then(|link| link.parent);
        Some(current)
    }
}

#[derive(Debug)]
/// Depth-first iterator for children, it contains the start link itself
///
/// Children are visited in the order they were attached.
pub struct Descendants<'a, T: RealField, P> {
    links: &'a [Link<T, P>],
    stack: Vec<LinkId>,
}

impl<'a, T: RealField, P> Descendants<'a, T, P> {
    pub fn new(links: &'a [Link<T, P>], start: LinkId) -> Self {
        Self {
            links,
            stack: vec![start],
        }
    }
}

impl<'a, T: RealField, P> Iterator for Descendants<'a, T, P> {
    type Item = LinkId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        if let Some(link) = self.links.get(id.0) {
            self.stack.extend(link.children.iter().rev());
        }
        Some(id)
    }
}
