//! Persona reply templates
//!
//! The persona is an elderly, easily confused account holder whose grandson
//! "handles the banking". Replies stall for time and keep asking for contact
//! details, handles, accounts and links, which is what the counterparty is
//! most likely to reveal.

use async_trait::async_trait;
use rand::seq::SliceRandom;

use honeypot_core::{EvidenceCategory, FraudCategory, ReplyContext, ReplyGenerator};

/// Reply pools by turn number (index 0 is turn 1)
const TURN_POOLS: [&[&str]; 10] = [
    &[
        "Oh my goodness, this sounds very serious! Who am I speaking with? Please tell me your name and which department you are calling from.",
        "Hai Ram, what is this now? Please tell me slowly, who is calling? What is your name and employee ID?",
        "Oh dear, I am an old woman and I get confused very easily. Can you explain again, slowly? What did you say your name was?",
    ],
    &[
        "Now I am really worried. My grandson usually takes care of these things. Can you give me your phone number so he can call you back?",
        "Beta, I do not understand these phone things at all. Please give me your direct number, my grandson Rahul will ring you. He does all my banking.",
        "This is all so confusing for me. Give me a number where I can reach you, my son will call back in five minutes.",
    ],
    &[
        "Yes, yes, I am writing it all down. But my eyes are weak, can you repeat the details once more? Maybe send an email also?",
        "Wait, wait, let me find my reading glasses. I want to write everything properly. What was your email ID? I keep records of everything.",
        "I am trying to follow, beta. Can you send the details on email? Or some link where I can read the instructions slowly?",
    ],
    &[
        "OK beta, I am trying, but this phone is so complicated. My grandson set it up for me. Tell me exactly step by step. Which account number should I type?",
        "I found my bank passbook! But first tell me, which bank are you calling from? And what is the reference number for this case?",
        "Achha, I understand. But one thing is confusing me, you said my account is blocked? I took out money only yesterday. What is your UPI ID so I can check?",
    ],
    &[
        "Beta, my phone is showing some error. Can you send a link where I can do this online? Or tell me the website address?",
        "Nothing is happening on my phone. Should I try from the computer? Please give me the link to your portal.",
        "Arey, this is taking so long. Is there a helpline I can call? Or send the instructions on WhatsApp? What is YOUR WhatsApp number?",
    ],
    &[
        "Sorry beta, someone was at the door. I am back now. You were saying about my account... can you start again? What was your name?",
        "I told my neighbour about this and she is worried her account is also affected. Can you give me the toll-free number so she can call?",
        "The line went quiet for a moment. Are you still there? I want to be sure I am talking to the right person. What is your supervisor's name and email?",
    ],
    &[
        "OK, I think I am understanding now. But before I do anything, let me note all your details. Name, phone number, department, employee ID. Rahul will want to see.",
        "My grandson always says to verify before sharing anything. Can you give me your bank's official email, or a link where I can check who you are?",
        "Let me find my spectacles again. Also, can you give me a case ID or reference number? And the official website? I want to be sure this is genuine.",
    ],
    &[
        "Beta, I am sitting at the computer now. Rahul set it up for me but there are so many things on the screen. Which website should I open? What is the URL?",
        "I found my bank statement, but it shows a different account number from what you said. Can you check again? Which account should I verify?",
        "I am almost done, but my phone is asking about UPI now. Which UPI ID should I be looking for?",
    ],
    &[
        "OK beta, I have written everything. Let me read it back so nothing is wrong. Your phone number was... can you say it once more?",
        "Before I do anything, I will email all this to my grandson. Can you repeat the phone number and account details one more time?",
        "I am feeling a bit scared now. Maybe I should go to the bank tomorrow. But if it is so urgent, give me ALL your contact details so Rahul can handle it tonight.",
    ],
    &[
        "Thank you for being so patient with me, beta. I will ask Rahul to look into this. Can I have your contact details for follow-up?",
        "You have been so kind to an old lady. Let me save all your details, phone, email, everything. Rahul will take it from here.",
        "OK, let me summarise. You said your name is... from which department... and the phone number was... Is that all correct? I am writing to the bank also.",
    ],
];

/// Category-specific follow-up questions
#[derive(Debug, Clone, Copy)]
struct Probes {
    phone: &'static str,
    payment_handle: &'static str,
    bank_account: &'static str,
    link: &'static str,
    email: &'static str,
}

const BANK_PROBES: Probes = Probes {
    phone: "Can you give me the bank's helpline number? Or your direct number so my grandson can verify?",
    payment_handle: "Should I check through UPI also? Which UPI ID should I look for in my transactions?",
    bank_account: "Which account are you talking about? Tell me the last few digits, I have more than one.",
    link: "Is there a secure link on the bank website where I can see my account status?",
    email: "Can you send me a confirmation email? I want everything in writing for my records.",
};

const UPI_PROBES: Probes = Probes {
    phone: "Which number should I send the payment to? Let me write it carefully.",
    payment_handle: "What is the exact UPI ID I should use? Please spell it out slowly.",
    bank_account: "Which bank account is linked to this UPI? I want to use the right one.",
    link: "Is there a link where I can see the cashback details? My grandson always checks links first.",
    email: "Can you email me the transaction details? I keep a record of everything.",
};

const PHISHING_PROBES: Probes = Probes {
    phone: "This offer sounds wonderful! But I want to check first. What is the customer care number?",
    payment_handle: "How do I pay for this? Should I use UPI? What is the payment UPI ID?",
    bank_account: "Where should I enter my details? I don't want to put them in the wrong place.",
    link: "Can you send the link again? My phone could not open it. Please share it once more.",
    email: "Can you send the offer details to my email? I want to read it properly before going ahead.",
};

const INVESTMENT_PROBES: Probes = Probes {
    phone: "This investment sounds interesting. Can you give me a number so I can discuss with our family's financial advisor?",
    payment_handle: "Can I invest through UPI? Which UPI ID should I transfer to?",
    bank_account: "Where do I invest? Which bank account should the money go to?",
    link: "Is there a website where I can read about this scheme? Please share the link.",
    email: "Can you email me the scheme documents? My CA will want to see them.",
};

const LOTTERY_PROBES: Probes = Probes {
    phone: "Oh my, I won? Who should I contact to claim it? Please give me the office number.",
    payment_handle: "Can I receive the prize by UPI? Which UPI ID sends the payment?",
    bank_account: "Where will the prize money be deposited? Should I share my account?",
    link: "Is there a website where I can check my winning ticket? Please share the link.",
    email: "Can you email me the winner certificate? I want to show my family!",
};

fn probes_for(category: FraudCategory) -> &'static Probes {
    match category {
        FraudCategory::UpiFraud => &UPI_PROBES,
        FraudCategory::Phishing => &PHISHING_PROBES,
        FraudCategory::InvestmentScam => &INVESTMENT_PROBES,
        FraudCategory::LotteryScam => &LOTTERY_PROBES,
        FraudCategory::BankFraud | FraudCategory::GenericScam => &BANK_PROBES,
    }
}

/// Missing evidence is probed in this order, each from the given turn on
const PROBE_ORDER: [(EvidenceCategory, u32); 5] = [
    (EvidenceCategory::PhoneNumbers, 2),
    (EvidenceCategory::PaymentHandles, 3),
    (EvidenceCategory::BankAccounts, 4),
    (EvidenceCategory::Links, 5),
    (EvidenceCategory::EmailAddresses, 6),
];

/// [`ReplyGenerator`] drawing from fixed persona templates
#[derive(Debug, Clone)]
pub struct TemplateReplyGenerator {
    max_template_turn: u32,
}

impl Default for TemplateReplyGenerator {
    fn default() -> Self {
        Self::new(TURN_POOLS.len() as u32)
    }
}

impl TemplateReplyGenerator {
    /// Turns past `max_template_turn` reuse that turn's pool
    pub fn new(max_template_turn: u32) -> Self {
        Self { max_template_turn }
    }

    fn pool(&self, turn: u32) -> &'static [&'static str] {
        let capped = turn.min(self.max_template_turn).max(1) as usize;
        TURN_POOLS[capped.min(TURN_POOLS.len()) - 1]
    }

    /// Follow-up question for the first missing artifact, if one is due
    fn probe(context: &ReplyContext<'_>) -> Option<&'static str> {
        let probes = probes_for(context.category);
        PROBE_ORDER
            .iter()
            .find(|(category, from_turn)| {
                context.turn >= *from_turn && context.evidence.get(*category).is_empty()
            })
            .map(|(category, _)| match category {
                EvidenceCategory::PhoneNumbers => probes.phone,
                EvidenceCategory::PaymentHandles => probes.payment_handle,
                EvidenceCategory::BankAccounts => probes.bank_account,
                EvidenceCategory::Links => probes.link,
                _ => probes.email,
            })
    }

    /// Build the reply synchronously (the RNG is not `Send`)
    pub fn compose(&self, context: &ReplyContext<'_>) -> String {
        let base = self
            .pool(context.turn)
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or_default();

        match Self::probe(context) {
            Some(question) => format!("{} {}", base, question),
            None => base.to_string(),
        }
    }
}

#[async_trait]
impl ReplyGenerator for TemplateReplyGenerator {
    async fn generate(&self, context: ReplyContext<'_>) -> honeypot_core::Result<String> {
        Ok(self.compose(&context))
    }

    fn name(&self) -> &str {
        "template"
    }
}
