use std::collections::HashMap;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Keyword {
    Or,
    Xor,
    And,
    Not,
    Fd,
    Bk,
    Rt,
    Lt,
    Move,
    SetXY,
    Head,
    Home,
    GetX,
    GetY,
    GetHeading,
    Cs,
    Pu,
    Pd,
    SetColor,
    Output,
    Print,
    Scan,
    Make,
    Local,
    If,
    Repeat,
    To,
    End,
    True,
    False,
    Sleep,
}

impl Keyword {
    pub const ALL: [Keyword; 31] = [
        Keyword::Or,
        Keyword::Xor,
        Keyword::And,
        Keyword::Not,
        Keyword::Fd,
        Keyword::Bk,
        Keyword::Rt,
        Keyword::Lt,
        Keyword::Move,
        Keyword::SetXY,
        Keyword::Head,
        Keyword::Home,
        Keyword::GetX,
        Keyword::GetY,
        Keyword::GetHeading,
        Keyword::Cs,
        Keyword::Pu,
        Keyword::Pd,
        Keyword::SetColor,
        Keyword::Output,
        Keyword::Print,
        Keyword::Scan,
        Keyword::Make,
        Keyword::Local,
        Keyword::If,
        Keyword::Repeat,
        Keyword::To,
        Keyword::End,
        Keyword::True,
        Keyword::False,
        Keyword::Sleep,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Keyword::Or => "or",
            Keyword::Xor => "xor",
            Keyword::And => "and",
            Keyword::Not => "not",
            Keyword::Fd => "fd",
            Keyword::Bk => "bk",
            Keyword::Rt => "rt",
            Keyword::Lt => "lt",
            Keyword::Move => "move",
            Keyword::SetXY => "setxy",
            Keyword::Head => "head",
            Keyword::Home => "home",
            Keyword::GetX => "getx",
            Keyword::GetY => "gety",
            Keyword::GetHeading => "getheading",
            Keyword::Cs => "cs",
            Keyword::Pu => "pu",
            Keyword::Pd => "pd",
            Keyword::SetColor => "setcolor",
            Keyword::Output => "output",
            Keyword::Print => "print",
            Keyword::Scan => "scan",
            Keyword::Make => "make",
            Keyword::Local => "local",
            Keyword::If => "if",
            Keyword::Repeat => "repeat",
            Keyword::To => "to",
            Keyword::End => "end",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Sleep => "sleep",
        }
    }
}

impl TryFrom<&str> for Keyword {
    type Error = ();

    fn try_from(word: &str) -> Result<Self, Self::Error> {
        Keyword::ALL
            .iter()
            .copied()
            .find(|k| k.name() == word)
            .ok_or(())
    }
}

/// What the keyword table has to say about a word.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Lookup {
    Keyword(Keyword),
    /// The word is stored in the table but doesn't resolve to a keyword.
    Unresolved,
    Ident,
}

const MULTIPLIER: u32 = 71;
const MODULUS: u32 = 9887;

/// Polynomial hash over the bytes of `word`, last byte first.
pub fn hash(word: &str) -> u32 {
    word.bytes()
        .rev()
        .fold(0, |h, b| (MULTIPLIER * h + u32::from(b)) % MODULUS)
}

/// Hash-bucketed table of reserved words.
#[derive(Clone, Debug)]
pub struct KeywordMap {
    buckets: HashMap<u32, &'static str>,
}

impl Default for KeywordMap {
    fn default() -> Self {
        let mut buckets = HashMap::new();
        for kw in Keyword::ALL {
            // First one in wins, so a colliding keyword would read as an identifier.
            buckets.entry(hash(kw.name())).or_insert(kw.name());
        }
        KeywordMap { buckets }
    }
}

impl KeywordMap {
    pub fn lookup(&self, word: &str) -> Lookup {
        match self.buckets.get(&hash(word)) {
            Some(stored) if *stored == word => match Keyword::try_from(word) {
                Ok(kw) => Lookup::Keyword(kw),
                Err(()) => Lookup::Unresolved,
            },
            _ => Lookup::Ident,
        }
    }
}
