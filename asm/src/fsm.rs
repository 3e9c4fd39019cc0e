//! Character driven state machines.
//!
//! A [`Machine`] is a table of [`State`]s. Each state keeps its outgoing
//! [`Transition`]s in registration order and the first transition whose
//! [`CharSet`] contains the input character is taken. Side effects are plain
//! [`Action`] values applied to a [`Builder`] by [`Machine::step`], so a table
//! can be built once and shared.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharSet {
    Chars(Vec<char>),
    Range(char, char),
    Whitespace,
    Union(Vec<CharSet>),
    Not(Box<CharSet>),
}

impl CharSet {
    pub fn of(chars: &str) -> Self {
        CharSet::Chars(chars.chars().collect())
    }

    pub fn range(lo: char, hi: char) -> Self {
        CharSet::Range(lo, hi)
    }

    pub fn any() -> Self {
        CharSet::Not(Box::new(CharSet::Chars(vec![])))
    }

    /// Every character except the listed ones.
    pub fn except(chars: &str) -> Self {
        CharSet::of(chars).not()
    }

    pub fn or(self, other: CharSet) -> Self {
        match self {
            CharSet::Union(mut sets) => {
                sets.push(other);
                CharSet::Union(sets)
            }
            set => CharSet::Union(vec![set, other]),
        }
    }

    pub fn not(self) -> Self {
        match self {
            CharSet::Not(inner) => *inner,
            set => CharSet::Not(Box::new(set)),
        }
    }

    pub fn contains(&self, ch: char) -> bool {
        match self {
            CharSet::Chars(chars) => chars.contains(&ch),
            CharSet::Range(lo, hi) => (*lo..=*hi).contains(&ch),
            CharSet::Whitespace => ch.is_whitespace(),
            CharSet::Union(sets) => sets.iter().any(|set| set.contains(ch)),
            CharSet::Not(set) => !set.contains(ch),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<K> {
    /// Open the token at the current column.
    StartToken,
    /// Append the consumed character.
    Append,
    /// Append a fixed character instead of the consumed one.
    AppendLit(char),
    SetKind(K),
    /// Remember the current column as the spot to blame on rejection.
    Mark,
}

/// Receiver of the actions of the taken transition.
pub trait Builder<K> {
    fn start(&mut self, col: usize);
    fn push(&mut self, ch: char);
    fn set_kind(&mut self, kind: K);
    fn mark(&mut self, _col: usize) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(usize);

#[derive(Debug, Clone)]
pub struct Transition<K> {
    to: StateId,
    on: CharSet,
    actions: Vec<Action<K>>,
}

impl<K> Transition<K> {
    pub fn to(&self) -> StateId {
        self.to
    }

    pub fn actions(&self) -> &[Action<K>] {
        &self.actions
    }
}

#[derive(Debug, Clone)]
pub struct State<K> {
    name: &'static str,
    accepting: bool,
    transitions: Vec<Transition<K>>,
}

impl<K> State<K> {
    /// First registered transition accepting `ch`.
    pub fn transition(&self, ch: char) -> Option<&Transition<K>> {
        self.transitions.iter().find(|t| t.on.contains(ch))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting
    }
}

#[derive(Debug, Clone)]
pub struct Machine<K> {
    states: Vec<State<K>>,
    start: StateId,
}

impl<K: Copy> Machine<K> {
    pub fn new(start: &'static str) -> Self {
        Machine {
            states: vec![State {
                name: start,
                accepting: false,
                transitions: vec![],
            }],
            start: StateId(0),
        }
    }

    pub fn start(&self) -> StateId {
        self.start
    }

    pub fn add_state(&mut self, name: &'static str, accepting: bool) -> StateId {
        self.states.push(State {
            name,
            accepting,
            transitions: vec![],
        });
        StateId(self.states.len() - 1)
    }

    pub fn on(&mut self, from: StateId, to: StateId, on: CharSet, actions: &[Action<K>]) {
        self.states[from.0].transitions.push(Transition {
            to,
            on,
            actions: actions.to_vec(),
        });
    }

    pub fn state(&self, id: StateId) -> &State<K> {
        &self.states[id.0]
    }

    /// Takes one transition out of `from`, applying its actions to `builder`.
    /// `None` when no transition accepts `ch`.
    pub fn step<B: Builder<K>>(
        &self,
        from: StateId,
        ch: char,
        col: usize,
        builder: &mut B,
    ) -> Option<StateId> {
        let transition = self.state(from).transition(ch)?;
        for action in transition.actions() {
            match *action {
                Action::StartToken => builder.start(col),
                Action::Append => builder.push(ch),
                Action::AppendLit(lit) => builder.push(lit),
                Action::SetKind(kind) => builder.set_kind(kind),
                Action::Mark => builder.mark(col),
            }
        }
        Some(transition.to())
    }

    /// Runs from the start state over `chars[at..]` until no transition
    /// matches or the input ends. Returns the state reached and the index of
    /// the first unconsumed character.
    pub fn run<B: Builder<K>>(&self, chars: &[char], at: usize, builder: &mut B) -> (StateId, usize) {
        let mut state = self.start;
        let mut idx = at;
        while let Some(&ch) = chars.get(idx) {
            match self.step(state, ch, idx, builder) {
                Some(next) => {
                    state = next;
                    idx += 1;
                }
                None => break,
            }
        }
        (state, idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        start: Option<usize>,
        text: String,
        kind: Option<u8>,
    }

    impl Builder<u8> for Recorder {
        fn start(&mut self, col: usize) {
            self.start = Some(col);
        }
        fn push(&mut self, ch: char) {
            self.text.push(ch);
        }
        fn set_kind(&mut self, kind: u8) {
            self.kind = Some(kind);
        }
    }

    fn word_machine() -> Machine<u8> {
        let mut m = Machine::new("start");
        let word = m.add_state("word", true);
        let start = m.start();
        m.on(start, start, CharSet::Whitespace, &[]);
        m.on(
            start,
            word,
            CharSet::range('a', 'z'),
            &[Action::StartToken, Action::Append, Action::SetKind(1)],
        );
        m.on(word, word, CharSet::range('a', 'z'), &[Action::Append]);
        m
    }

    #[test]
    fn charset() {
        assert!(CharSet::of("abc").contains('b'));
        assert!(!CharSet::of("abc").contains('d'));
        assert!(CharSet::except("\"\\").contains('x'));
        assert!(!CharSet::except("\"\\").contains('"'));
        assert!(CharSet::any().contains('\0'));
        let alnum = CharSet::range('a', 'z').or(CharSet::range('0', '9'));
        assert!(alnum.contains('7') && alnum.contains('q') && !alnum.contains('_'));
        assert!(!alnum.clone().not().contains('q'));
        assert_eq!(alnum.clone().not().not(), alnum);
    }

    #[test]
    fn run_stops_at_unmatched_char() {
        let m = word_machine();
        let chars: Vec<char> = "  abc,d".chars().collect();
        let mut rec = Recorder::default();
        let (state, idx) = m.run(&chars, 0, &mut rec);
        assert_eq!(idx, 5);
        assert!(m.state(state).is_accepting());
        assert_eq!(m.state(state).name(), "word");
        assert_eq!(rec.start, Some(2));
        assert_eq!(rec.text, "abc");
        assert_eq!(rec.kind, Some(1));
    }

    #[test]
    fn first_registered_transition_wins() {
        let mut m: Machine<u8> = Machine::new("start");
        let x = m.add_state("x", true);
        let other = m.add_state("other", true);
        let start = m.start();
        m.on(start, x, CharSet::of("x"), &[Action::SetKind(1)]);
        m.on(start, other, CharSet::any(), &[Action::SetKind(2)]);

        let mut rec = Recorder::default();
        assert_eq!(m.step(start, 'x', 0, &mut rec), Some(x));
        assert_eq!(rec.kind, Some(1));
        assert_eq!(m.step(start, 'y', 0, &mut rec), Some(other));
        assert_eq!(rec.kind, Some(2));
    }

    #[test]
    fn actions_only_run_on_taken_transition() {
        let m = word_machine();
        let mut rec = Recorder::default();
        assert_eq!(m.step(m.start(), '1', 0, &mut rec), None);
        assert_eq!(rec.start, None);
        assert!(rec.text.is_empty());
    }

    #[test]
    fn literal_append() {
        let mut m: Machine<u8> = Machine::new("start");
        let esc = m.add_state("esc", true);
        let start = m.start();
        m.on(start, esc, CharSet::of("q"), &[Action::AppendLit('"')]);
        let mut rec = Recorder::default();
        m.step(start, 'q', 0, &mut rec);
        assert_eq!(rec.text, "\"");
    }
}
