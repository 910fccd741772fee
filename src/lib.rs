pub mod configuration;

pub mod probability {
    pub mod pullback;
    pub mod conditionalexpectation;
}

pub mod step {
    pub mod stepfunction;
    pub mod intervalset;
    pub mod compositefunction;
}

pub mod steperror;

pub mod terms {
    pub mod term;
    pub mod termscodec;
    pub mod merge;
    pub mod terms;
}
