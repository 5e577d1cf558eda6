use crate::runtime::data_structures::word::WordRef;
use rpds::{ HashTrieMapSync, ListSync };
use std::{ collections::BTreeMap,
           sync::Arc,
           fmt::{ self, Display, Formatter } };



/// Key of a dictionary entry, the namespace the word was defined in (None for the root) and the
/// upper-cased name.
type WordKey = (Option<String>, String);

/// Every definition of a name, newest first.  Older definitions are shadowed, not replaced.
type Definitions = ListSync<WordRef>;

type WordMap = HashTrieMapSync<WordKey, Definitions>;



/// A frozen copy of the dictionary's state.  Taking one is cheap because the word map is a
/// persistent structure, the snapshot shares everything with the live dictionary.
#[derive(Clone)]
pub struct Snapshot
{
    words: WordMap,
    search_order: Vec<Option<String>>,
    current: Option<String>,
    latest: Option<WordRef>
}


/// The interpreter's dictionary of words, organized in namespaces.
///
/// The search order lists the namespaces consulted when resolving a name, first entry first.  The
/// root namespace is always consulted last even when it's not part of the search order.  New
/// definitions go into the current namespace, which is independent of the search order.
#[derive(Clone)]
pub struct Dictionary
{
    words: WordMap,
    search_order: Vec<Option<String>>,
    current: Option<String>,
    latest: Option<WordRef>
}


impl Default for Dictionary
{
    fn default() -> Self
    {
        Self::new()
    }
}


/// List the words visible through the current search order, the way `WORDS` prints them.
impl Display for Dictionary
{
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result
    {
        let words = self.visible_words();
        let width = words.iter().map(|word| word.display_name().len()).max().unwrap_or(0);

        writeln!(formatter, "{} words defined.", words.len())?;
        writeln!(formatter)?;

        for word in words.iter()
        {
            if word.signature().is_empty()
            {
                writeln!(formatter, "{:width$}  {}", word.display_name(), word.description(),
                         width = width)?;
            }
            else
            {
                writeln!(formatter, "{:width$}  {} -- {}", word.display_name(), word.signature(),
                         word.description(), width = width)?;
            }
        }

        Ok(())
    }
}


fn key(namespace: &Option<String>, name: &str) -> WordKey
{
    ( namespace.clone(), name.to_uppercase() )
}


impl Dictionary
{
    /// Create a new empty dictionary searching only the root namespace.
    pub fn new() -> Dictionary
    {
        Dictionary
            {
                words: HashTrieMapSync::new_sync(),
                search_order: vec![ None ],
                current: None,
                latest: None
            }
    }

    /// Install a word into the namespace recorded in the word.  An existing word of the same name
    /// in that namespace is shadowed.
    pub fn define(&mut self, word: WordRef)
    {
        if let Some(name) = word.name()
        {
            let key = key(word.namespace(), name);
            let definitions = match self.words.get(&key)
                {
                    Some(existing) => existing.push_front(word.clone()),
                    None => ListSync::new_sync().push_front(word.clone())
                };

            self.words.insert_mut(key, definitions);
        }

        self.latest = Some(word);
    }

    /// Find a word by name, walking the search order and then the root namespace.  Case is not
    /// significant.
    pub fn resolve(&self, name: &str) -> Option<WordRef>
    {
        self.resolve_key(name).and_then(|key| self.lookup_key(&key))
    }

    /// Look a word up in one specific namespace, regardless of the search order.
    pub fn lookup_in(&self, namespace: &Option<String>, name: &str) -> Option<WordRef>
    {
        self.lookup_key(&key(namespace, name))
    }

    /// Remove the newest definition of the name visible through the search order.  An older
    /// definition of the same name becomes visible again.
    pub fn forget(&mut self, name: &str) -> Option<WordRef>
    {
        let key = self.resolve_key(name)?;
        let definitions = self.words.get(&key)?.clone();
        let removed = definitions.first().cloned();

        match definitions.drop_first()
        {
            Some(rest) if !rest.is_empty() => self.words.insert_mut(key, rest),
            _ =>
                {
                    let _ = self.words.remove_mut(&key);
                }
        }

        let removed_latest = match ( &self.latest, &removed )
            {
                ( Some(latest), Some(removed) ) => Arc::ptr_eq(latest, removed),
                _ => false
            };

        if removed_latest
        {
            self.latest = None;
        }

        removed
    }

    /// Capture the current state for a later restore.
    pub fn snapshot(&self) -> Snapshot
    {
        Snapshot
            {
                words: self.words.clone(),
                search_order: self.search_order.clone(),
                current: self.current.clone(),
                latest: self.latest.clone()
            }
    }

    /// Go back to a previously captured state.  Everything defined since is gone and the search
    /// order is what it was.
    pub fn restore(&mut self, snapshot: &Snapshot)
    {
        self.words = snapshot.words.clone();
        self.search_order = snapshot.search_order.clone();
        self.current = snapshot.current.clone();
        self.latest = snapshot.latest.clone();
    }

    /// Build a dictionary from a snapshot, as used by child interpreters.
    pub fn from_snapshot(snapshot: &Snapshot) -> Dictionary
    {
        let mut dictionary = Dictionary::new();

        dictionary.restore(snapshot);
        dictionary
    }

    /// The most recently defined word, named or not.
    pub fn latest(&self) -> &Option<WordRef>
    {
        &self.latest
    }

    /// Swap the most recent definition for an updated version of itself, as `IMMEDIATE` needs.
    /// The old word value isn't touched, execution tokens already taken still refer to it.
    pub fn replace_latest(&mut self, updated: WordRef)
    {
        if let Some(name) = updated.name()
        {
            let key = key(updated.namespace(), name);

            if let Some(definitions) = self.words.get(&key)
            {
                let rest = definitions.drop_first().unwrap_or_else(ListSync::new_sync);
                let definitions = rest.push_front(updated.clone());

                self.words.insert_mut(key, definitions);
            }
        }

        self.latest = Some(updated);
    }

    /// The namespace new definitions are placed in.
    pub fn current(&self) -> &Option<String>
    {
        &self.current
    }

    pub fn set_current(&mut self, namespace: Option<String>)
    {
        self.current = namespace;
    }

    /// The namespaces consulted during lookup, first entry first.
    pub fn search_order(&self) -> &Vec<Option<String>>
    {
        &self.search_order
    }

    /// Replace the first namespace of the search order.  This is what executing a vocabulary's
    /// word does.
    pub fn replace_first_in_order(&mut self, namespace: Option<String>)
    {
        if self.search_order.is_empty()
        {
            self.search_order.push(namespace);
        }
        else
        {
            self.search_order[0] = namespace;
        }
    }

    /// Duplicate the first namespace of the search order, `ALSO`.
    pub fn duplicate_first_in_order(&mut self)
    {
        let first = self.search_order.first().cloned().unwrap_or(None);
        self.search_order.insert(0, first);
    }

    /// Drop the first namespace from the search order, `PREVIOUS`.  Returns false if there was
    /// nothing to drop.
    pub fn drop_first_in_order(&mut self) -> bool
    {
        if self.search_order.is_empty()
        {
            return false;
        }

        let _ = self.search_order.remove(0);
        true
    }

    /// Reset the search order to just the root namespace, `ONLY`.
    pub fn reset_order(&mut self)
    {
        self.search_order = vec![ None ];
    }

    /// The visible words reachable through the search order, one entry per name, sorted by name.
    pub fn visible_words(&self) -> Vec<WordRef>
    {
        let mut found = BTreeMap::new();

        for ( ( namespace, name ), definitions ) in self.words.iter()
        {
            if !self.is_searched(namespace)
            {
                continue;
            }

            let Some(word) = definitions.first()
            else
            {
                continue;
            };

            if let Some(resolved) = self.resolve(name)
            {
                if Arc::ptr_eq(&resolved, word)
                {
                    let _ = found.insert(name.clone(), resolved);
                }
            }
        }

        found.into_values().collect()
    }

    fn is_searched(&self, namespace: &Option<String>) -> bool
    {
        namespace.is_none() || self.search_order.contains(namespace)
    }

    /// Find the key under which the name resolves through the search order.
    fn resolve_key(&self, name: &str) -> Option<WordKey>
    {
        self.search_order
            .iter()
            .chain(std::iter::once(&None))
            .map(|namespace| key(namespace, name))
            .find(|key| self.words.contains_key(key))
    }

    fn lookup_key(&self, key: &WordKey) -> Option<WordRef>
    {
        self.words.get(key).and_then(|definitions| definitions.first().cloned())
    }
}


#[cfg(test)]
mod tests
{
    use super::*;
    use crate::{ lang::source_buffer::SourceLocation,
                 runtime::data_structures::{ value::Value,
                                             word::{ Word, WordBody } } };

    fn constant(name: &str, namespace: Option<&str>, value: i64) -> WordRef
    {
        Arc::new(Word::new(Some(name.to_string()),
                           SourceLocation::new(),
                           WordBody::Constant(Value::Int(value)))
                     .with_namespace(namespace.map(|ns| ns.to_string())))
    }

    fn constant_value(word: &WordRef) -> i64
    {
        match word.body()
        {
            WordBody::Constant(Value::Int(value)) => *value,
            _ => panic!("not an integer constant")
        }
    }

    #[test]
    fn lookup_is_case_insensitive()
    {
        let mut dictionary = Dictionary::new();
        dictionary.define(constant("answer", None, 42));

        assert!(dictionary.resolve("ANSWER").is_some());
        assert!(dictionary.resolve("Answer").is_some());
        assert!(dictionary.resolve("question").is_none());
    }

    #[test]
    fn redefinition_shadows_and_forget_reveals()
    {
        let mut dictionary = Dictionary::new();
        dictionary.define(constant("x", None, 1));
        dictionary.define(constant("x", None, 2));

        assert_eq!(constant_value(&dictionary.resolve("x").unwrap()), 2);

        let forgotten = dictionary.forget("x").unwrap();
        assert_eq!(constant_value(&forgotten), 2);
        assert_eq!(constant_value(&dictionary.resolve("x").unwrap()), 1);

        let _ = dictionary.forget("x");
        assert!(dictionary.resolve("x").is_none());
        assert!(dictionary.forget("x").is_none());
    }

    #[test]
    fn search_order_controls_visibility()
    {
        let mut dictionary = Dictionary::new();
        dictionary.define(constant("x", None, 1));
        dictionary.define(constant("x", Some("A"), 2));

        assert_eq!(constant_value(&dictionary.resolve("x").unwrap()), 1);

        dictionary.duplicate_first_in_order();
        dictionary.replace_first_in_order(Some("A".to_string()));
        assert_eq!(constant_value(&dictionary.resolve("x").unwrap()), 2);

        assert!(dictionary.drop_first_in_order());
        assert_eq!(constant_value(&dictionary.resolve("x").unwrap()), 1);

        // Explicit lookup ignores the search order.
        let explicit = dictionary.lookup_in(&Some("A".to_string()), "X").unwrap();
        assert_eq!(constant_value(&explicit), 2);
    }

    #[test]
    fn root_is_always_searched()
    {
        let mut dictionary = Dictionary::new();
        dictionary.define(constant("base-word", None, 1));

        assert!(dictionary.drop_first_in_order());
        assert!(dictionary.search_order().is_empty());
        assert!(dictionary.resolve("base-word").is_some());
    }

    #[test]
    fn restore_discards_later_definitions()
    {
        let mut dictionary = Dictionary::new();
        dictionary.define(constant("kept", None, 1));

        let snapshot = dictionary.snapshot();

        dictionary.define(constant("dropped", None, 2));
        dictionary.define(constant("kept", None, 3));
        dictionary.set_current(Some("B".to_string()));

        dictionary.restore(&snapshot);

        assert!(dictionary.resolve("dropped").is_none());
        assert_eq!(constant_value(&dictionary.resolve("kept").unwrap()), 1);
        assert_eq!(dictionary.current(), &None);
    }

    #[test]
    fn snapshots_are_isolated_from_later_changes()
    {
        let mut dictionary = Dictionary::new();
        let snapshot = dictionary.snapshot();

        dictionary.define(constant("late", None, 1));

        let child = Dictionary::from_snapshot(&snapshot);
        assert!(child.resolve("late").is_none());
    }

    #[test]
    fn visible_words_are_sorted_and_unique()
    {
        let mut dictionary = Dictionary::new();
        dictionary.define(constant("b", None, 1));
        dictionary.define(constant("a", None, 1));
        dictionary.define(constant("b", None, 2));

        let names: Vec<String> = dictionary.visible_words()
                                           .iter()
                                           .map(|word| word.display_name())
                                           .collect();

        assert_eq!(names, vec![ "a", "b" ]);
    }
}
