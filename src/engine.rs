/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    thread::{self, JoinHandle},
};

use anyhow::{bail, Result};
use tracing::{debug, warn};

use crate::{OpeningBook, Position, Search, SearchConfig, SearchResult, TTable, TablebaseProbe};

/// Runs searches on a worker thread, keeping the transposition table alive between them.
///
/// Only one search may run at a time.
pub struct Engine {
    /// Shared with the worker thread for the duration of a search.
    ttable: Arc<Mutex<TTable>>,

    /// Set while a search is running. Clearing it tells the worker to stop.
    is_searching: Arc<AtomicBool>,

    search_thread: Option<JoinHandle<SearchResult>>,

    book: Option<Arc<OpeningBook>>,

    tablebase: Option<Arc<dyn TablebaseProbe + Sync>>,
}

impl Engine {
    /// Creates a new [`Engine`] with a transposition table of `mb` megabytes.
    pub fn new(mb: usize) -> Self {
        Self {
            ttable: Arc::new(Mutex::new(TTable::new(mb))),
            is_searching: Arc::new(AtomicBool::new(false)),
            search_thread: None,
            book: None,
            tablebase: None,
        }
    }

    /// Attach an opening book that every subsequent search will probe first.
    pub fn set_book(&mut self, book: OpeningBook) {
        self.book = Some(Arc::new(book));
    }

    /// Attach an endgame tablebase that every subsequent search will consult.
    pub fn set_tablebase(&mut self, tablebase: impl TablebaseProbe + Sync + 'static) {
        self.tablebase = Some(Arc::new(tablebase));
    }

    /// Returns `true` if the engine is currently executing a search.
    #[inline(always)]
    pub fn is_searching(&self) -> bool {
        self.is_searching.load(Ordering::Relaxed)
    }

    /// Starts a search on a copy of `position`, given the parameters in `config`.
    ///
    /// Returns immediately. Use [`Engine::stop_search`] or [`Engine::wait`] to collect the result.
    pub fn start_search(&mut self, position: &Position, config: SearchConfig) -> Result<()> {
        // Cannot start a search if one is already running
        if self.search_thread.is_some() {
            bail!("a search is already running");
        }
        self.is_searching.store(true, Ordering::Relaxed);

        // Clone the parameters that will be sent into the thread
        let mut position = position.clone();
        let is_searching = Arc::clone(&self.is_searching);
        let ttable = Arc::clone(&self.ttable);
        let book = self.book.clone();
        let tablebase = self.tablebase.clone();

        let handle = thread::spawn(move || {
            let mut ttable = lock(&ttable);
            let mut search = Search::new(Arc::clone(&is_searching), config, &mut ttable);

            if let Some(book) = book.as_deref() {
                search = search.with_book(book);
            }
            if let Some(tablebase) = tablebase.as_deref() {
                search = search.with_tablebase(tablebase);
            }

            let res = search.start(&mut position);

            // Searches that end on their own also lower the flag
            is_searching.store(false, Ordering::Relaxed);
            res
        });

        debug!(thread = ?handle.thread().id(), "spawned search thread");
        self.search_thread = Some(handle);
        Ok(())
    }

    /// Signals the running search to stop and returns its result.
    ///
    /// Returns `None` if no search was running.
    pub fn stop_search(&mut self) -> Option<SearchResult> {
        self.is_searching.store(false, Ordering::Relaxed);
        self.wait()
    }

    /// Blocks until the running search finishes on its own and returns its result.
    ///
    /// Returns `None` if no search was running.
    pub fn wait(&mut self) -> Option<SearchResult> {
        // Can't wait on a search if there aren't any threads searching
        let handle = self.search_thread.take()?;

        let id = handle.thread().id();
        let res = match handle.join() {
            Ok(res) => Some(res),
            Err(_) => {
                warn!(thread = ?id, "search thread panicked");
                None
            }
        };

        self.is_searching.store(false, Ordering::Relaxed);
        res
    }

    /// Runs a search to completion on the current thread.
    pub fn search(&mut self, position: &Position, config: SearchConfig) -> Result<SearchResult> {
        self.start_search(position, config)?;
        match self.wait() {
            Some(res) => Ok(res),
            None => bail!("search thread exited without a result"),
        }
    }

    /// Clears the transposition table. Stops any running search first.
    pub fn clear_ttable(&mut self) {
        self.stop_search();
        lock(&self.ttable).clear();
    }

    /// Replaces the transposition table with one of `mb` megabytes. Stops any running search first.
    pub fn resize_ttable(&mut self, mb: usize) {
        self.stop_search();
        *lock(&self.ttable) = TTable::new(mb);
    }

    /// Number of occupied transposition table entries.
    pub fn ttable_entries(&self) -> usize {
        lock(&self.ttable).num_entries()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(TTable::DEFAULT_SIZE)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop_search();
    }
}

/// A panicked search leaves the table in a usable, if incomplete, state.
fn lock(ttable: &Mutex<TTable>) -> MutexGuard<'_, TTable> {
    ttable.lock().unwrap_or_else(PoisonError::into_inner)
}
