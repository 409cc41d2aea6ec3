// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Types to navigate cursored collections.
//!
//! Several API endpoints hand back their results a page at a time, with each
//! page carrying a pair of opaque tokens pointing at the previous and next
//! pages. The types here model exactly that: [`PageCursor`] is one token,
//! [`CursorPage`] is the raw page as it comes off the wire, and
//! [`CursoredList`] is the caller-facing page with frozen cursors and
//! derived `has_next`/`has_previous` flags.
//!
//! [`PageCursor`]: struct.PageCursor.html
//! [`CursorPage`]: struct.CursorPage.html
//! [`CursoredList`]: struct.CursoredList.html

use serde::Deserialize;

/// An opaque, server-issued reference to a page of results.
///
/// Cursors are handed out by the service; the only value with client-side
/// meaning is zero, which marks the absence of a page. Negative and positive
/// values are both valid tokens, and their magnitude or ordering carries no
/// information. Hand the token back on the next call and nothing more.
///
/// The `Default` value is [`NONE`].
///
/// [`NONE`]: #associatedconstant.NONE
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(i64);

impl PageCursor {
    /// The sentinel cursor, marking that there is no page in this direction.
    pub const NONE: PageCursor = PageCursor(0);

    /// Returns true if this cursor refers to an actual page, i.e. it is not
    /// the zero sentinel.
    pub fn exists(self) -> bool {
        self.0 != 0
    }

    /// Returns the raw token, for echoing back as a `cursor` parameter on
    /// the next call.
    pub fn value(self) -> i64 {
        self.0
    }
}

impl From<i64> for PageCursor {
    fn from(raw: i64) -> PageCursor {
        PageCursor(raw)
    }
}

impl std::fmt::Display for PageCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Trait to generalize over raw paginated views of API results.
///
/// Types that implement `Cursor` are intermediate wire shapes; consumer code
/// usually converts them into a [`CursoredList`] right away via
/// [`CursoredList::from_cursor`]. The trait is public so that code layered
/// on top of this crate can unpack its own page types the same way.
///
/// [`CursoredList`]: struct.CursoredList.html
/// [`CursoredList::from_cursor`]: struct.CursoredList.html#method.from_cursor
pub trait Cursor {
    /// What type of item is being returned by the API call?
    type Item;

    /// Returns the cursor for the previous page of results.
    fn previous_cursor(&self) -> PageCursor;
    /// Returns the cursor for the next page of results.
    fn next_cursor(&self) -> PageCursor;
    /// Consumes the page and returns the collection of results from inside.
    fn into_inner(self) -> Vec<Self::Item>;
}

/// A single page of a cursored endpoint, as it appears on the wire.
///
/// Cursored endpoints all share one envelope: `previous_cursor`,
/// `next_cursor`, and an array of items whose key varies by endpoint
/// (`users` on follower lists, `ids` on ID lists, `lists` on list
/// ownership). The serde aliases on the item field accept all of them, so
/// one generic page type covers every cursored call.
#[derive(Debug, Deserialize)]
pub struct CursorPage<T> {
    /// Cursor for the previous page of results.
    pub previous_cursor: PageCursor,
    /// Cursor for the next page of results.
    pub next_cursor: PageCursor,
    /// The items in this page of results.
    #[serde(alias = "users", alias = "ids", alias = "lists")]
    pub items: Vec<T>,
}

impl<T> Cursor for CursorPage<T> {
    type Item = T;

    fn previous_cursor(&self) -> PageCursor {
        self.previous_cursor
    }

    fn next_cursor(&self) -> PageCursor {
        self.next_cursor
    }

    fn into_inner(self) -> Vec<T> {
        self.items
    }
}

/// A page of results from a cursored endpoint, ready for consumption.
///
/// This is the type endpoint operations hand back for anything paginated:
/// the items of the current page in server order, plus the two cursors that
/// were delivered alongside them. The cursors are set once, at
/// construction, and cannot change afterwards; [`has_next`] and
/// [`has_previous`] are computed from them on every call rather than being
/// stored, so they can never drift out of sync.
///
/// [`has_next`]: #method.has_next
/// [`has_previous`]: #method.has_previous
///
/// The list derefs to its item storage, so the usual read-only slice and
/// iterator machinery is available directly:
///
/// ```
/// use waxwing::cursor::CursoredList;
///
/// let page = CursoredList::new(vec!["misty", "rustlang"], 0.into(), 1374004777531007833.into());
///
/// assert_eq!(page.len(), 2);
/// assert!(page.has_next());
/// assert!(!page.has_previous());
///
/// for name in &page {
///     println!("{}", name);
/// }
/// ```
///
/// To fetch the following page, echo `next_cursor().value()` back to the
/// endpoint as its `cursor` parameter.
#[derive(Debug, Clone, derive_more::Deref)]
pub struct CursoredList<T> {
    #[deref]
    items: Vec<T>,
    previous_cursor: PageCursor,
    next_cursor: PageCursor,
}

impl<T> CursoredList<T> {
    /// Assembles a page from its items and the two cursors delivered with
    /// them. An empty item list is a valid page (a terminal page, or an
    /// empty collection).
    pub fn new(
        items: Vec<T>,
        previous_cursor: PageCursor,
        next_cursor: PageCursor,
    ) -> CursoredList<T> {
        CursoredList {
            items,
            previous_cursor,
            next_cursor,
        }
    }

    /// Converts a raw wire page into a `CursoredList`.
    pub fn from_cursor<C: Cursor<Item = T>>(page: C) -> CursoredList<T> {
        let previous_cursor = page.previous_cursor();
        let next_cursor = page.next_cursor();

        CursoredList {
            items: page.into_inner(),
            previous_cursor,
            next_cursor,
        }
    }

    /// The cursor for the page of results before this one.
    pub fn previous_cursor(&self) -> PageCursor {
        self.previous_cursor
    }

    /// The cursor for the page of results after this one.
    pub fn next_cursor(&self) -> PageCursor {
        self.next_cursor
    }

    /// Returns true if a page of results precedes this one.
    pub fn has_previous(&self) -> bool {
        self.previous_cursor.exists()
    }

    /// Returns true if a page of results follows this one.
    pub fn has_next(&self) -> bool {
        self.next_cursor.exists()
    }

    /// Consumes the page, returning the items inside and discarding the
    /// cursors.
    pub fn into_inner(self) -> Vec<T> {
        self.items
    }

    /// Maps a function over the items of this page, keeping the cursors.
    pub fn map<F, U>(self, f: F) -> CursoredList<U>
    where
        F: FnMut(T) -> U,
    {
        CursoredList {
            items: self.items.into_iter().map(f).collect(),
            previous_cursor: self.previous_cursor,
            next_cursor: self.next_cursor,
        }
    }
}

impl<T> IntoIterator for CursoredList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a CursoredList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
